//! API endpoint configuration injected into templates using the `api` strategy.

use crate::session::ApiEndpointInfo;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One endpoint the generated script calls, tagged by its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiEndpoint {
    ProductList {
        url: String,
        method: String,
        headers: BTreeMap<String, String>,
        params: BTreeMap<String, String>,
    },
    ProductDetail {
        url: String,
        method: String,
        headers: BTreeMap<String, String>,
    },
}

#[derive(Serialize)]
struct EndpointBody<'a> {
    url: &'a str,
    method: &'a str,
    headers: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a BTreeMap<String, String>>,
}

impl ApiEndpoint {
    /// The key the template reads this endpoint under.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiEndpoint::ProductList { .. } => "productList",
            ApiEndpoint::ProductDetail { .. } => "productDetail",
        }
    }

    fn body(&self) -> EndpointBody<'_> {
        match self {
            ApiEndpoint::ProductList {
                url,
                method,
                headers,
                params,
            } => EndpointBody {
                url,
                method,
                headers,
                params: Some(params),
            },
            ApiEndpoint::ProductDetail {
                url,
                method,
                headers,
            } => EndpointBody {
                url,
                method,
                headers,
                params: None,
            },
        }
    }
}

/// The endpoints block written in place of the template's placeholder.
///
/// A product-list endpoint is always present; the detail endpoint is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpointsConfig {
    product_list: ApiEndpoint,
    product_detail: Option<ApiEndpoint>,
}

impl ApiEndpointsConfig {
    /// Picks endpoints from analysis results.
    ///
    /// The list endpoint is the first one flagged as a product list or whose URL
    /// mentions `product`; the detail endpoint is the first one flagged as a
    /// product detail or whose URL contains `product/` or `products/`. Returns
    /// `None` when no list endpoint qualifies.
    pub fn select(endpoints: &[ApiEndpointInfo]) -> Option<Self> {
        let list = endpoints
            .iter()
            .find(|e| e.is_product_list || e.url.contains("product"))?;
        let detail = endpoints.iter().find(|e| {
            e.is_product_detail || e.url.contains("product/") || e.url.contains("products/")
        });

        Some(Self {
            product_list: ApiEndpoint::ProductList {
                url: list.url.clone(),
                method: method_or_get(&list.method),
                headers: headers_or_default(&list.headers),
                params: list.parameters.clone(),
            },
            product_detail: detail.map(|e| ApiEndpoint::ProductDetail {
                url: e.url.clone(),
                method: method_or_get(&e.method),
                headers: headers_or_default(&e.headers),
            }),
        })
    }

    pub fn product_list(&self) -> &ApiEndpoint {
        &self.product_list
    }

    pub fn product_detail(&self) -> Option<&ApiEndpoint> {
        self.product_detail.as_ref()
    }

    /// Pretty JSON object keyed by endpoint kind. Key order is fixed, so equal
    /// configs always render identically.
    pub fn to_json_block(&self) -> String {
        let mut map = Map::new();
        for endpoint in std::iter::once(&self.product_list).chain(self.product_detail.as_ref()) {
            let body = serde_json::to_value(endpoint.body()).unwrap_or(Value::Null);
            map.insert(endpoint.kind().to_string(), body);
        }
        serde_json::to_string_pretty(&Value::Object(map)).unwrap_or_else(|_| "{}".to_string())
    }
}

fn method_or_get(method: &str) -> String {
    if method.trim().is_empty() {
        "GET".to_string()
    } else {
        method.to_string()
    }
}

fn headers_or_default(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    if headers.is_empty() {
        BTreeMap::from([("Accept".to_string(), "application/json".to_string())])
    } else {
        headers.clone()
    }
}
