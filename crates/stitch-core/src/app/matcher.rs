//! Resource matching: which pool a task can be handed to, and which VM shape
//! reproduces it.
//!
//! Inventory is eventually consistent. A miss is a normal answer ("not yet"),
//! only a failing directory is an error.

use tracing::{info, warn};

use super::lifecycle::TaskOperations;
use crate::domain::{Pool, PoolName, Task, TaskError, TaskVm};
use crate::error::StitchError;

impl TaskOperations {
    /// Pool the task can be scheduled to, if any.
    ///
    /// A VM requirement is matched against scale sets by SKU and image; the
    /// first match decides the pool (the task's own pool name when it has
    /// one, otherwise the scale set's). Without a VM requirement the task's
    /// pool name is looked up directly.
    pub async fn get_pool(&self, task: &Task) -> Result<Option<Pool>, StitchError> {
        if let Some(vm) = &task.config.vm {
            let scalesets = self
                .ctx
                .scalesets
                .search_by_sku_image(&vm.sku, &vm.image)
                .await?;
            if let Some(scaleset) = scalesets.into_iter().next() {
                let pool_name = task
                    .config
                    .pool_name()
                    .cloned()
                    .unwrap_or(scaleset.pool_name);
                return self.pool_by_name(task, &pool_name).await;
            }
        } else if let Some(pool_name) = task.config.pool_name() {
            return self.pool_by_name(task, pool_name).await;
        }

        warn!(
            task_id = %task.task_id,
            "unable to find a scaleset that matches the task prereqs"
        );
        Ok(None)
    }

    async fn pool_by_name(
        &self,
        task: &Task,
        pool_name: &PoolName,
    ) -> Result<Option<Pool>, StitchError> {
        let pool = self.ctx.pools.get_by_name(pool_name).await?;
        if pool.is_none() {
            info!(
                task_id = %task.task_id,
                pool = %pool_name,
                "unable to schedule task to pool"
            );
        }
        Ok(pool)
    }

    /// VM shape for reproducing a crash of this task outside its pool.
    pub async fn get_repro_vm_config(&self, task: &Task) -> Result<Option<TaskVm>, StitchError> {
        if let Some(vm) = &task.config.vm {
            return Ok(Some(vm.clone()));
        }

        let Some(pool_name) = task.config.pool_name() else {
            return Err(StitchError::InvalidArgument(TaskError::invalid_argument(
                format!("either pool or vm must be specified: {}", task.task_id),
            )));
        };

        if self.ctx.pools.get_by_name(pool_name).await?.is_none() {
            info!(task_id = %task.task_id, pool = %pool_name, "unable to find pool from task");
            return Ok(None);
        }

        let scalesets = self.ctx.scalesets.search_by_pool(pool_name).await?;
        let Some(scaleset) = scalesets.into_iter().next() else {
            warn!(
                job_id = %task.job_id,
                task_id = %task.task_id,
                pool = %pool_name,
                "no scalesets are defined for task"
            );
            return Ok(None);
        };

        Ok(Some(TaskVm::new(
            scaleset.region,
            scaleset.vm_sku,
            scaleset.image,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::fixtures::Harness;
    use crate::domain::{ErrorCode, Os, PoolId, Scaleset, ScalesetId, TaskConfig, TaskState};

    fn scaleset(id: u128, pool: &str, sku: &str, image: &str) -> Scaleset {
        Scaleset {
            scaleset_id: ScalesetId::from_u128(id),
            pool_name: PoolName::new(pool),
            region: "westus2".to_string(),
            vm_sku: sku.to_string(),
            image: image.to_string(),
        }
    }

    async fn task_with(h: &Harness, configure: impl FnOnce(TaskConfig) -> TaskConfig) -> Task {
        let mut task = h.add_task(1, TaskState::Waiting, &[]).await;
        let mut config = task.config.clone();
        config.pool = None;
        task.config = configure(config);
        task
    }

    #[tokio::test]
    async fn pool_by_name() {
        let h = Harness::new().await;
        let pool = Pool::new(PoolId::from_u128(1), "pool-A", Os::Linux);
        h.backend.inventory.add_pool(pool.clone()).await;
        let task = h.add_task(1, TaskState::Waiting, &[]).await;

        assert_eq!(h.ops.get_pool(&task).await.unwrap(), Some(pool));
    }

    #[tokio::test]
    async fn unknown_pool_is_no_match() {
        let h = Harness::new().await;
        let task = h.add_task(1, TaskState::Waiting, &[]).await;

        assert_eq!(h.ops.get_pool(&task).await.unwrap(), None);
    }

    #[tokio::test]
    async fn vm_requirement_resolves_pool_through_scaleset() {
        let h = Harness::new().await;
        let pool = Pool::new(PoolId::from_u128(2), "pool-B", Os::Linux);
        h.backend.inventory.add_pool(pool.clone()).await;
        h.backend
            .inventory
            .add_scaleset(scaleset(1, "pool-B", "D2s", "ubuntu"))
            .await;
        let task = task_with(&h, |c| {
            c.with_vm(TaskVm::new("westus2", "D2s", "ubuntu"))
                .with_pool("pool-B", 1)
        })
        .await;

        assert_eq!(h.ops.get_pool(&task).await.unwrap(), Some(pool));
    }

    #[tokio::test]
    async fn vm_requirement_without_scaleset_is_no_match() {
        let h = Harness::new().await;
        h.backend
            .inventory
            .add_pool(Pool::new(PoolId::from_u128(2), "pool-B", Os::Linux))
            .await;
        h.backend
            .inventory
            .add_scaleset(scaleset(1, "pool-B", "D4s", "ubuntu"))
            .await;
        let task = task_with(&h, |c| {
            c.with_vm(TaskVm::new("westus2", "D2s", "ubuntu"))
                .with_pool("pool-B", 1)
        })
        .await;

        assert_eq!(h.ops.get_pool(&task).await.unwrap(), None);
    }

    #[tokio::test]
    async fn vm_only_requirement_uses_scaleset_pool() {
        let h = Harness::new().await;
        let pool = Pool::new(PoolId::from_u128(3), "pool-C", Os::Windows);
        h.backend.inventory.add_pool(pool.clone()).await;
        h.backend
            .inventory
            .add_scaleset(scaleset(1, "pool-C", "D2s", "win2022"))
            .await;
        let task = task_with(&h, |c| c.with_vm(TaskVm::new("eastus", "D2s", "win2022"))).await;

        assert_eq!(h.ops.get_pool(&task).await.unwrap(), Some(pool));
    }

    #[tokio::test]
    async fn no_requirement_is_no_match() {
        let h = Harness::new().await;
        let task = task_with(&h, |c| c).await;

        assert_eq!(h.ops.get_pool(&task).await.unwrap(), None);
    }

    #[tokio::test]
    async fn repro_vm_is_returned_verbatim() {
        let h = Harness::new().await;
        let mut vm = TaskVm::new("eastus", "D8s", "ubuntu");
        vm.reboot_after_setup = Some(true);
        let task = task_with(&h, |c| c.with_vm(vm.clone())).await;

        assert_eq!(h.ops.get_repro_vm_config(&task).await.unwrap(), Some(vm));
    }

    #[tokio::test]
    async fn repro_vm_is_synthesized_from_pool_scaleset() {
        let h = Harness::new().await;
        h.backend
            .inventory
            .add_pool(Pool::new(PoolId::from_u128(1), "pool-A", Os::Linux))
            .await;
        h.backend
            .inventory
            .add_scaleset(scaleset(1, "pool-A", "D2s", "ubuntu"))
            .await;
        let task = h.add_task(1, TaskState::Running, &[]).await;

        let vm = h.ops.get_repro_vm_config(&task).await.unwrap();

        assert_eq!(vm, Some(TaskVm::new("westus2", "D2s", "ubuntu")));
    }

    #[tokio::test]
    async fn repro_vm_needs_pool_or_vm() {
        let h = Harness::new().await;
        let task = task_with(&h, |c| c).await;

        let err = h.ops.get_repro_vm_config(&task).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert!(err.to_string().contains("either pool or vm must be specified"));
    }

    #[tokio::test]
    async fn repro_vm_missing_pool_or_scaleset_is_no_match() {
        let h = Harness::new().await;
        let task = h.add_task(1, TaskState::Running, &[]).await;
        assert_eq!(h.ops.get_repro_vm_config(&task).await.unwrap(), None);

        h.backend
            .inventory
            .add_pool(Pool::new(PoolId::from_u128(1), "pool-A", Os::Linux))
            .await;
        assert_eq!(h.ops.get_repro_vm_config(&task).await.unwrap(), None);
    }
}
