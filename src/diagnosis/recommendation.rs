use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::catalog::ProductCatalog;
use super::classifier::Diagnosis;
use super::domain::{CategoryKey, ScoreVector};

/// Payload handed to the recommendation collaborator once a session resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub result_type: String,
    pub aura_keyword: String,
    pub scores: ScoreVector,
}

impl RecommendationRequest {
    pub fn from_diagnosis(diagnosis: &Diagnosis) -> Self {
        Self {
            result_type: diagnosis.category.0.clone(),
            aura_keyword: diagnosis.result.aura_keyword.clone(),
            scores: diagnosis.scores,
        }
    }

    /// Category key the request targets, normalized the way the collaborator matches skin types.
    pub fn skin_type(&self) -> CategoryKey {
        CategoryKey::new(self.result_type.trim().to_uppercase().replace(' ', "_"))
    }
}

/// Product record returned by the collaborator, kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendedProduct(Value);

impl RecommendedProduct {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Product id as text. Numeric ids are rendered as numbers.
    pub fn id(&self) -> Option<String> {
        scalar_label(self.get("id")?)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name")?.as_str()
    }

    pub fn price_label(&self) -> Option<String> {
        scalar_label(self.get("price")?)
    }
}

impl From<Value> for RecommendedProduct {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

fn scalar_label(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Where a resolved session stands with its product recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationStatus {
    Pending,
    Ready { products: Vec<RecommendedProduct> },
}

/// Outbound hook for product recommendations (HTTP service or in-process catalog).
pub trait RecommendationService: Send + Sync {
    fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> impl Future<Output = Result<Vec<RecommendedProduct>, RecommendationError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("recommendation transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("recommendation service rejected the request: {0}")]
    Rejected(String),
    #[error("recommendation service unavailable: {0}")]
    Unavailable(String),
}

/// Asks `service` for products, degrading to an empty list on failure.
pub async fn recommend_or_empty<C>(
    service: &C,
    request: &RecommendationRequest,
) -> Vec<RecommendedProduct>
where
    C: RecommendationService,
{
    match service.recommend(request).await {
        Ok(products) => {
            debug!(
                result_type = %request.result_type,
                count = products.len(),
                "recommendations received"
            );
            products
        }
        Err(err) => {
            warn!(
                result_type = %request.result_type,
                error = %err,
                "recommendations unavailable, continuing without products"
            );
            Vec::new()
        }
    }
}

/// Client for the remote `POST /api/diagnosis` recommendation endpoint.
#[derive(Debug, Clone)]
pub struct HttpRecommendationClient {
    client: reqwest::Client,
    endpoint: String,
    limit: usize,
}

impl HttpRecommendationClient {
    pub fn new(base_url: &str, timeout: Duration, limit: usize) -> Result<Self, RecommendationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/diagnosis", base_url.trim_end_matches('/')),
            limit,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct DiagnosisSaveResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<DiagnosisSaveData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiagnosisSaveData {
    #[serde(default)]
    recommended_products: Vec<RecommendedProduct>,
}

impl RecommendationService for HttpRecommendationClient {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<RecommendedProduct>, RecommendationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?
            .error_for_status()?;

        let body: DiagnosisSaveResponse = response.json().await?;
        if !body.success {
            return Err(RecommendationError::Rejected(
                body.message
                    .unwrap_or_else(|| "request was not accepted".to_string()),
            ));
        }

        let mut products = body
            .data
            .map(|data| data.recommended_products)
            .unwrap_or_default();
        products.truncate(self.limit);
        Ok(products)
    }
}

/// In-process recommender that serves the bundled product catalog.
#[derive(Debug, Clone)]
pub struct CatalogRecommender {
    catalog: ProductCatalog,
    limit: usize,
}

impl CatalogRecommender {
    pub fn new(catalog: ProductCatalog, limit: usize) -> Self {
        Self { catalog, limit }
    }

    pub fn standard(limit: usize) -> Self {
        Self::new(ProductCatalog::standard(), limit)
    }
}

impl RecommendationService for CatalogRecommender {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<RecommendedProduct>, RecommendationError> {
        let skin_type = request.skin_type();
        Ok(self
            .catalog
            .for_skin_type(&skin_type)
            .take(self.limit)
            .map(RecommendedProduct::from)
            .collect())
    }
}
