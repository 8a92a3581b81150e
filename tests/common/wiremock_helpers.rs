use serde_json::Value;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use supplygraph::config::{ApiConfig, AppConfig};

pub const API_PREFIX: &str = "/api/rdp";

/// `[api]` settings pointing at a mock server
pub fn api_config(server: &MockServer, app_key: Option<&str>) -> ApiConfig {
    let mut api = AppConfig::default_config().unwrap().api;
    api.base_url = format!("{}{}", server.uri(), API_PREFIX);
    api.app_key = app_key.map(str::to_string);
    api.request_timeout_secs = 5;
    api
}

/// Organisation search answering `common_name` with one hit per identifier given
pub async fn mock_search(server: &MockServer, common_name: &str, rics: &[&str]) {
    let hits: Vec<Value> = rics
        .iter()
        .map(|ric| serde_json::json!({ "PrimaryRIC": ric }))
        .collect();

    Mock::given(method("POST"))
        .and(path(format!("{}/discovery/search/v1/", API_PREFIX)))
        .and(body_partial_json(serde_json::json!({
            "View": "Organisations",
            "Filter": format!("CommonName xeq '{}'", common_name),
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "Hits": hits })))
        .mount(server)
        .await;
}

/// Data-grid endpoint answering any request whose body mentions `field_code`
pub async fn mock_grid(server: &MockServer, field_code: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path(format!("{}/data/datagrid/beta1/", API_PREFIX)))
        .and(body_string_contains(field_code))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub fn intel_firm_grid() -> Value {
    serde_json::json!({
        "headers": [
            {"name": "instrument", "title": "Instrument"},
            {"name": "TR.CommonName", "title": "Company Common Name"},
            {"name": "TR.RIC", "title": "RIC"},
            {"name": "TR.HeadquartersCountry", "title": "Country of Headquarters"},
            {"name": "TR.CompanyMarketCapitalization", "title": "Company Market Capitalization"},
            {"name": "TR.F.RevGoodsSrvc5YrAvg", "title": "Revenue 5Y Avg"}
        ],
        "data": [
            ["INTC.OQ", "Intel Corp", "INTC.OQ", "United States", 1.2e11, 6.5e10]
        ]
    })
}

/// Two links for Intel: a strong one to TSMC and a weak one to a fabless vendor
pub fn intel_relationship_grid() -> Value {
    serde_json::json!({
        "headers": [
            {"name": "instrument", "title": "Instrument"},
            {"name": "TR.SCRelationship.ScorgIDOut", "title": "Buyer Identifier"},
            {"name": "TR.SCRelationship", "title": "Relationship"},
            {"name": "TR.SCRelationship.instrument", "title": "Supplier Identifier"},
            {"name": "TR.SCRelationshipConfidenceScore", "title": "Value Chains Relationship Confidence Score"}
        ],
        "data": [
            ["INTC.OQ", "INTC.OQ", "Supplier", "2330.TW", 0.91],
            ["INTC.OQ", "INTC.OQ", "Supplier", "WEAK.N", 0.2]
        ]
    })
}
