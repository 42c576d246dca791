//! PoolDirectory / ScalesetDirectory ports - 計算資源の在庫（読み取り専用）

use async_trait::async_trait;

use super::task_store::StoreError;
use crate::domain::{Pool, PoolName, Scaleset};

#[async_trait]
pub trait PoolDirectory: Send + Sync {
    /// `Ok(None)` is "no such pool", a normal answer rather than a failure.
    async fn get_by_name(&self, name: &PoolName) -> Result<Option<Pool>, StoreError>;
}

#[async_trait]
pub trait ScalesetDirectory: Send + Sync {
    async fn search_by_sku_image(&self, sku: &str, image: &str)
    -> Result<Vec<Scaleset>, StoreError>;

    async fn search_by_pool(&self, pool_name: &PoolName) -> Result<Vec<Scaleset>, StoreError>;
}
