use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::CategoryKey;
use super::recommendation::RecommendedProduct;

/// Product record served by the in-process catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub name_ko: String,
    pub description: String,
    pub price: u64,
    pub category: String,
    pub image_url: String,
    pub ingredients: Vec<String>,
    pub skin_types: Vec<CategoryKey>,
    pub aura_keyword: String,
}

impl Product {
    pub fn suits(&self, skin_type: &CategoryKey) -> bool {
        self.skin_types.contains(skin_type)
    }
}

impl From<&Product> for RecommendedProduct {
    fn from(product: &Product) -> Self {
        RecommendedProduct::new(json!({
            "id": product.id,
            "name": product.name,
            "nameKo": product.name_ko,
            "description": product.description,
            "price": product.price,
            "category": product.category,
            "imageUrl": product.image_url,
            "ingredients": product.ingredients,
            "skinTypes": product.skin_types,
            "auraKeyword": product.aura_keyword,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products tagged for `skin_type`, in catalog order.
    pub fn for_skin_type<'a>(
        &'a self,
        skin_type: &'a CategoryKey,
    ) -> impl Iterator<Item = &'a Product> + 'a {
        self.products
            .iter()
            .filter(move |product| product.suits(skin_type))
    }

    pub fn standard() -> Self {
        Self::new(standard_products())
    }
}

fn product(
    id: &str,
    (name, name_ko): (&str, &str),
    description: &str,
    price: u64,
    category: &str,
    ingredients: &[&str],
    skin_types: &[&str],
    aura_keyword: &str,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        name_ko: name_ko.to_string(),
        description: description.to_string(),
        price,
        category: category.to_string(),
        image_url: format!("/images/product-{category}.jpg"),
        ingredients: ingredients.iter().map(|item| item.to_string()).collect(),
        skin_types: skin_types.iter().map(|key| CategoryKey::new(*key)).collect(),
        aura_keyword: aura_keyword.to_string(),
    }
}

fn standard_products() -> Vec<Product> {
    vec![
        product(
            "prod_001",
            ("Hydra Serum", "하이드라 세럼"),
            "Deep hydration serum with hyaluronic acid complex",
            89_000,
            "serum",
            &["Hyaluronic Acid", "Niacinamide", "Vitamin E", "Aloe Vera"],
            &["DRY", "OILY_DEHYDRATED", "NORMAL"],
            "Pale Yellow",
        ),
        product(
            "prod_002",
            ("Calm Essence", "카밍 에센스"),
            "Soothing essence for sensitive and reactive skin",
            78_000,
            "essence",
            &["Centella Asiatica", "Panthenol", "Allantoin", "Green Tea"],
            &["SENSITIVE", "NORMAL"],
            "Dreamy Pink",
        ),
        product(
            "prod_003",
            ("Oil Control Gel", "오일 컨트롤 젤"),
            "Lightweight gel moisturizer for oily skin types",
            65_000,
            "moisturizer",
            &["Niacinamide", "Salicylic Acid", "Tea Tree", "Zinc"],
            &["OILY", "COMBINATION"],
            "Vivid Orange",
        ),
        product(
            "prod_004",
            ("Balance Cream", "밸런스 크림"),
            "Perfect cream for combination skin types",
            95_000,
            "cream",
            &["Ceramide", "Squalane", "Vitamin C", "Peptides"],
            &["COMBINATION", "NORMAL"],
            "Mystic Purple",
        ),
        product(
            "prod_005",
            ("Aqua Burst Ampoule", "아쿠아 버스트 앰플"),
            "Intensive hydration for dehydrated oily skin",
            120_000,
            "ampoule",
            &["Low Molecular HA", "Beta-Glucan", "Trehalose", "Panthenol"],
            &["OILY_DEHYDRATED", "DRY"],
            "Electric Blue",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_products_by_skin_type_in_catalog_order() {
        let catalog = ProductCatalog::standard();
        let key = CategoryKey::new("NORMAL");
        let ids: Vec<_> = catalog
            .for_skin_type(&key)
            .map(|product| product.id.as_str())
            .collect();
        assert_eq!(ids, vec!["prod_001", "prod_002", "prod_004"]);
    }

    #[test]
    fn recommended_product_keeps_catalog_fields() {
        let catalog = ProductCatalog::standard();
        let recommended = RecommendedProduct::from(&catalog.products()[2]);
        assert_eq!(recommended.id().as_deref(), Some("prod_003"));
        assert_eq!(
            recommended.get("nameKo").and_then(|v| v.as_str()),
            Some("오일 컨트롤 젤")
        );
        assert_eq!(recommended.price_label().as_deref(), Some("65000"));
        assert_eq!(
            recommended.get("auraKeyword").and_then(|v| v.as_str()),
            Some("Vivid Orange")
        );
    }
}
