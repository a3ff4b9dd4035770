//! redb-backed menu storage

use async_trait::async_trait;
use redb::{ReadableDatabase, ReadableTable};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};
use shared::util::now_millis;
use shared::{AppError, ErrorCode};

use super::MenuCatalog;
use crate::db::{COUNTERS_TABLE, DbService, MENU_ITEMS_TABLE, StorageError, StorageResult};

const MENU_ID_KEY: &str = "menu_item_id";

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;

/// Upper bound for a menu price
pub const MAX_MENU_PRICE: f64 = 10_000.0;

fn check_name(name: &str) -> Result<(), AppError> {
    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(AppError::validation(format!(
            "name must be {}-{} characters, got {}",
            NAME_MIN_CHARS, NAME_MAX_CHARS, len
        ))
        .with_detail("field", "name"));
    }
    Ok(())
}

fn check_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price <= 0.0 || price > MAX_MENU_PRICE {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            format!("price must be in (0, {}], got {}", MAX_MENU_PRICE, price),
        )
        .with_detail("field", "price"));
    }
    Ok(())
}

fn decode(bytes: &[u8]) -> StorageResult<MenuItem> {
    Ok(serde_json::from_slice(bytes)?)
}

fn name_taken<T>(table: &T, name: &str, except: Option<i64>) -> StorageResult<bool>
where
    T: ReadableTable<i64, &'static [u8]>,
{
    for entry in table.iter()? {
        let (key, value) = entry?;
        if Some(key.value()) == except {
            continue;
        }
        if decode(value.value())?.name == name {
            return Ok(true);
        }
    }
    Ok(false)
}

fn into_app_error(err: StorageError) -> AppError {
    match err {
        StorageError::MenuItemNotFound(id) => AppError::with_message(
            ErrorCode::MenuItemNotFound,
            format!("Menu item {} not found", id),
        )
        .with_detail("menu_item_id", id),
        StorageError::DuplicateMenuName(name) => AppError::with_message(
            ErrorCode::MenuItemNameExists,
            format!("Menu item '{}' already exists", name),
        )
        .with_detail("name", name),
        other => AppError::database(other.to_string()),
    }
}

/// Menu storage backed by redb
#[derive(Clone)]
pub struct MenuStorage {
    db: DbService,
}

impl MenuStorage {
    pub fn new(db: DbService) -> Self {
        Self { db }
    }

    /// All menu items ordered by ID
    pub async fn list(&self) -> Result<Vec<MenuItem>, AppError> {
        self.db
            .run(|db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(MENU_ITEMS_TABLE)?;
                let mut items = Vec::new();
                for entry in table.iter()? {
                    let (_, value) = entry?;
                    items.push(decode(value.value())?);
                }
                Ok(items)
            })
            .await
            .map_err(into_app_error)
    }

    /// Items customers can order
    pub async fn list_available(&self) -> Result<Vec<MenuItem>, AppError> {
        let mut items = self.list().await?;
        items.retain(|item| item.available);
        Ok(items)
    }

    pub async fn get(&self, id: i64) -> Result<MenuItem, AppError> {
        self.get_menu_item(id).await.map_err(into_app_error)
    }

    pub async fn create(&self, data: MenuItemCreate) -> Result<MenuItem, AppError> {
        check_name(&data.name)?;
        check_price(data.price)?;

        self.db
            .run(move |db| {
                let write_txn = db.begin_write()?;
                let item = {
                    let mut items = write_txn.open_table(MENU_ITEMS_TABLE)?;
                    if name_taken(&items, &data.name, None)? {
                        return Err(StorageError::DuplicateMenuName(data.name));
                    }

                    let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
                    let next = counters.get(MENU_ID_KEY)?.map(|g| g.value()).unwrap_or(0) + 1;
                    counters.insert(MENU_ID_KEY, next)?;

                    let now = now_millis();
                    let item = MenuItem {
                        id: next as i64,
                        name: data.name,
                        price: data.price,
                        category: data.category,
                        image_url: data.image_url,
                        available: data.available.unwrap_or(true),
                        created_at: now,
                        updated_at: now,
                    };
                    let bytes = serde_json::to_vec(&item)?;
                    items.insert(item.id, bytes.as_slice())?;
                    item
                };
                write_txn.commit()?;
                Ok(item)
            })
            .await
            .map_err(into_app_error)
    }

    pub async fn update(&self, id: i64, data: MenuItemUpdate) -> Result<MenuItem, AppError> {
        if let Some(name) = &data.name {
            check_name(name)?;
        }
        if let Some(price) = data.price {
            check_price(price)?;
        }

        self.db
            .run(move |db| {
                let write_txn = db.begin_write()?;
                let item = {
                    let mut items = write_txn.open_table(MENU_ITEMS_TABLE)?;
                    let bytes = items.get(id)?.map(|g| g.value().to_vec());
                    let mut item = match bytes {
                        Some(bytes) => decode(&bytes)?,
                        None => return Err(StorageError::MenuItemNotFound(id)),
                    };

                    if let Some(name) = data.name {
                        if name_taken(&items, &name, Some(id))? {
                            return Err(StorageError::DuplicateMenuName(name));
                        }
                        item.name = name;
                    }
                    if let Some(price) = data.price {
                        item.price = price;
                    }
                    if let Some(category) = data.category {
                        item.category = Some(category);
                    }
                    if let Some(image_url) = data.image_url {
                        item.image_url = Some(image_url);
                    }
                    if let Some(available) = data.available {
                        item.available = available;
                    }
                    item.updated_at = now_millis();

                    let bytes = serde_json::to_vec(&item)?;
                    items.insert(id, bytes.as_slice())?;
                    item
                };
                write_txn.commit()?;
                Ok(item)
            })
            .await
            .map_err(into_app_error)
    }

    /// Orders keep their snapshotted lines, so deleting is always safe
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.db
            .run(move |db| {
                let write_txn = db.begin_write()?;
                {
                    let mut items = write_txn.open_table(MENU_ITEMS_TABLE)?;
                    if items.remove(id)?.is_none() {
                        return Err(StorageError::MenuItemNotFound(id));
                    }
                }
                write_txn.commit()?;
                Ok(())
            })
            .await
            .map_err(into_app_error)
    }
}

#[async_trait]
impl MenuCatalog for MenuStorage {
    async fn get_menu_item(&self, id: i64) -> StorageResult<MenuItem> {
        self.db
            .run(move |db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(MENU_ITEMS_TABLE)?;
                let bytes = table.get(id)?.map(|g| g.value().to_vec());
                match bytes {
                    Some(bytes) => decode(&bytes),
                    None => Err(StorageError::MenuItemNotFound(id)),
                }
            })
            .await
    }
}
