//! Product variants service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;
use uuid::Uuid;

use crate::{
    database::Db,
    domain::variants::{
        data::NewVariant,
        errors::VariantsServiceError,
        records::{VariantRecord, VariantUuid},
        repository::PgVariantsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgVariantsService {
    db: Db,
    repository: PgVariantsRepository,
}

impl PgVariantsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgVariantsRepository::new(),
        }
    }
}

#[async_trait]
impl VariantsService for PgVariantsService {
    #[tracing::instrument(
        name = "variants.service.create_variant",
        skip(self, variant),
        fields(variant_uuid = %variant.uuid, product_uuid = %variant.product_uuid),
        err
    )]
    async fn create_variant(
        &self,
        variant: NewVariant,
    ) -> Result<VariantRecord, VariantsServiceError> {
        if variant.name.trim().is_empty() {
            return Err(VariantsServiceError::EmptyName);
        }

        let mut tx = self.db.begin().await?;

        let created = self.repository.create_variant(&mut tx, variant).await?;

        tx.commit().await?;

        info!(variant_uuid = %created.uuid, "created variant");

        Ok(created)
    }

    async fn get_variant(
        &self,
        variant: VariantUuid,
    ) -> Result<VariantRecord, VariantsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.repository.get_variant(&mut tx, variant).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_variants(
        &self,
        product: Uuid,
    ) -> Result<Vec<VariantRecord>, VariantsServiceError> {
        let mut tx = self.db.begin().await?;

        let records = self.repository.list_variants(&mut tx, product).await?;

        tx.commit().await?;

        Ok(records)
    }
}

#[automock]
#[async_trait]
pub trait VariantsService: Send + Sync {
    /// Create a variant with zero stock.
    async fn create_variant(
        &self,
        variant: NewVariant,
    ) -> Result<VariantRecord, VariantsServiceError>;

    /// Retrieve a single variant.
    async fn get_variant(
        &self,
        variant: VariantUuid,
    ) -> Result<VariantRecord, VariantsServiceError>;

    /// List the variants of a product, oldest first.
    async fn list_variants(
        &self,
        product: Uuid,
    ) -> Result<Vec<VariantRecord>, VariantsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::{TestContext, helpers::new_variant};

    use super::*;

    #[tokio::test]
    async fn create_variant_starts_with_zero_stock() -> TestResult {
        let ctx = TestContext::new().await;
        let product = Uuid::now_v7();

        let variant = ctx
            .variants
            .create_variant(NewVariant {
                price_adjustment: 250,
                ..new_variant(product, "Large / Navy")
            })
            .await?;

        assert_eq!(variant.product_uuid, product);
        assert_eq!(variant.stock_quantity, 0);
        assert_eq!(variant.price_adjustment, 250);

        Ok(())
    }

    #[tokio::test]
    async fn get_variant_unknown_uuid_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.variants.get_variant(VariantUuid::new()).await;

        assert!(
            matches!(result, Err(VariantsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_variant_duplicate_uuid_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;
        let variant = new_variant(Uuid::now_v7(), "Small");

        ctx.variants.create_variant(variant.clone()).await?;

        let result = ctx.variants.create_variant(variant).await;

        assert!(
            matches!(result, Err(VariantsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn blank_names_are_rejected() {
        let ctx = TestContext::new().await;

        let result = ctx
            .variants
            .create_variant(new_variant(Uuid::now_v7(), "  "))
            .await;

        assert!(
            matches!(result, Err(VariantsServiceError::EmptyName)),
            "expected EmptyName, got {result:?}"
        );
    }

    #[tokio::test]
    async fn list_variants_only_returns_the_product() -> TestResult {
        let ctx = TestContext::new().await;
        let product = Uuid::now_v7();

        ctx.variants
            .create_variant(new_variant(product, "Small"))
            .await?;
        ctx.variants
            .create_variant(new_variant(product, "Medium"))
            .await?;
        ctx.variants
            .create_variant(new_variant(Uuid::now_v7(), "Other"))
            .await?;

        let variants = ctx.variants.list_variants(product).await?;

        assert_eq!(variants.len(), 2);
        assert!(variants.iter().all(|v| v.product_uuid == product));

        Ok(())
    }
}
