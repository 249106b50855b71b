use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use realzen_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{ConfigError, Configuration};

const SEARCH_ENDPOINT: &str = "https://zillow56.p.rapidapi.com/search";
const RAPIDAPI_HOST: &str = "zillow56.p.rapidapi.com";

/// A property type flag understood by the listings API.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, JsonSchema,
)]
pub enum PropertyType {
    /// Single-family homes.
    #[serde(rename = "isSingleFamily")]
    SingleFamily,
    /// Multi-family homes.
    #[serde(rename = "isMultiFamily")]
    MultiFamily,
    /// Condos.
    #[serde(rename = "isCondo")]
    Condo,
    /// Townhouses.
    #[serde(rename = "isTownhouse")]
    Townhouse,
    /// Apartments.
    #[serde(rename = "isApartment")]
    Apartment,
    /// Land.
    #[serde(rename = "isLotLand")]
    LotLand,
    /// Manufactured homes.
    #[serde(rename = "isManufactured")]
    Manufactured,
}

impl PropertyType {
    /// Every property type, in the order their flags are sent.
    pub const ALL: [PropertyType; 7] = [
        PropertyType::SingleFamily,
        PropertyType::MultiFamily,
        PropertyType::Condo,
        PropertyType::Townhouse,
        PropertyType::Apartment,
        PropertyType::LotLand,
        PropertyType::Manufactured,
    ];

    /// Returns the query parameter of this type.
    pub fn flag(self) -> &'static str {
        match self {
            PropertyType::SingleFamily => "isSingleFamily",
            PropertyType::MultiFamily => "isMultiFamily",
            PropertyType::Condo => "isCondo",
            PropertyType::Townhouse => "isTownhouse",
            PropertyType::Apartment => "isApartment",
            PropertyType::LotLand => "isLotLand",
            PropertyType::Manufactured => "isManufactured",
        }
    }
}

const DEFAULT_TYPES: &[PropertyType] = &[PropertyType::SingleFamily];

/// Input of [`PropertySearchTool`].
///
/// Unknown keys are rejected rather than ignored; extra query parameters go
/// into `filters`. A `null` optional field counts as missing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchParameters {
    /// The location to search for properties, e.g. "San Francisco, CA".
    pub location: String,
    /// The types of property to search for, single-family homes by default.
    #[serde(default)]
    pub types: Option<Vec<PropertyType>>,
    /// The maximum number of search results to return, capped by the
    /// configured maximum.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Extra query parameters passed to the listings API as is, e.g.
    /// `{"status_type": "ForRent"}`.
    #[serde(default)]
    pub filters: Option<BTreeMap<String, String>>,
}

impl SearchParameters {
    /// Creates parameters searching single-family homes in `location`.
    #[inline]
    pub fn new<S: Into<String>>(location: S) -> Self {
        Self {
            location: location.into(),
            types: None,
            limit: None,
            filters: None,
        }
    }

    /// Searches for `types` instead of single-family homes.
    #[inline]
    pub fn with_types(
        mut self,
        types: impl IntoIterator<Item = PropertyType>,
    ) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    /// Caps the number of results.
    #[inline]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Adds an extra query parameter.
    pub fn with_filter<K: Into<String>, V: Into<String>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.filters
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Returns the property types to search for.
    #[inline]
    pub fn types(&self) -> &[PropertyType] {
        self.types.as_deref().unwrap_or(DEFAULT_TYPES)
    }
}

/// Builds the query string of a search.
///
/// The query holds the location, `output=json`, one flag per property type
/// and then the extra filters. Filters may not replace any of the other
/// parameters.
pub fn build_query(
    params: &SearchParameters,
) -> Result<Vec<(String, String)>, ToolError> {
    let location = params.location.trim();
    if location.is_empty() {
        return Err(ToolError::invalid_input()
            .with_reason("`location` must not be empty"));
    }

    let mut query = Vec::with_capacity(2 + PropertyType::ALL.len());
    query.push(("location".to_owned(), location.to_owned()));
    query.push(("output".to_owned(), "json".to_owned()));
    for ty in PropertyType::ALL {
        let enabled = params.types().contains(&ty);
        query.push((ty.flag().to_owned(), enabled.to_string()));
    }

    for (key, value) in params.filters.iter().flatten() {
        if query.iter().any(|(reserved, _)| reserved == key) {
            return Err(ToolError::invalid_input().with_reason(format!(
                "filter `{key}` would override a reserved parameter"
            )));
        }
        query.push((key.clone(), value.clone()));
    }
    Ok(query)
}

/// Returns how many records a search hands back.
pub fn effective_limit(
    limit: Option<usize>,
    max_results: NonZeroUsize,
) -> Result<usize, ToolError> {
    match limit {
        Some(0) => Err(ToolError::invalid_input()
            .with_reason("`limit` must be a positive integer")),
        Some(limit) => Ok(limit.min(max_results.get())),
        None => Ok(max_results.get()),
    }
}

/// Pulls the first `limit` records out of a search response body.
pub fn extract_results(
    body: &[u8],
    limit: usize,
) -> Result<Vec<Value>, ToolError> {
    let value: Value = serde_json::from_slice(body).map_err(|err| {
        ToolError::upstream_schema()
            .with_reason(format!("response is not JSON: {err}"))
    })?;
    let Value::Object(mut object) = value else {
        return Err(ToolError::upstream_schema()
            .with_reason("response is not a JSON object"));
    };
    let Some(Value::Array(mut results)) = object.remove("results") else {
        return Err(ToolError::upstream_schema()
            .with_reason("response has no `results` array"));
    };
    results.truncate(limit);
    Ok(results)
}

/// A tool searching property listings by location.
///
/// The tool is created with everything it needs from the [`Configuration`]
/// and never reads the environment itself.
pub struct PropertySearchTool {
    client: Client,
    endpoint: Arc<str>,
    api_key: Option<Arc<str>>,
    max_results: NonZeroUsize,
    parameter_schema: Value,
}

impl PropertySearchTool {
    /// The name the model calls this tool by.
    pub const NAME: &'static str = "search_for_properties_by_location";

    /// Creates a search tool from the configuration.
    pub fn new(config: &Configuration) -> Result<Self, ConfigError> {
        let client = Client::builder().timeout(config.http_timeout()).build()?;
        Ok(Self {
            client,
            endpoint: Arc::from(SEARCH_ENDPOINT),
            api_key: config.rapidapi_key().map(Arc::from),
            max_results: config.max_search_results(),
            parameter_schema: schema_for!(SearchParameters).to_value(),
        })
    }

    /// Sends searches to `endpoint` instead of the public listings API.
    #[inline]
    pub fn with_endpoint<S: AsRef<str>>(mut self, endpoint: S) -> Self {
        self.endpoint = Arc::from(endpoint.as_ref());
        self
    }

    /// Runs a search and returns the records in upstream order.
    pub fn search(
        &self,
        params: SearchParameters,
    ) -> impl Future<Output = Result<Vec<Value>, ToolError>> + Send + 'static
    {
        let prepared = self.prepare(&params);
        async move {
            let (request, limit) = prepared?;
            let resp = request.send().await.map_err(transport_error)?;

            let status = resp.status();
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
            {
                return Err(ToolError::auth_configuration().with_reason(
                    format!("listings API rejected the key ({status})"),
                ));
            }
            if !status.is_success() {
                return Err(ToolError::transport()
                    .with_reason(format!("listings API returned {status}")));
            }

            let body = resp.bytes().await.map_err(transport_error)?;
            let results = extract_results(&body, limit)?;
            debug!(count = results.len(), "got search results");
            Ok(results)
        }
    }

    fn prepare(
        &self,
        params: &SearchParameters,
    ) -> Result<(RequestBuilder, usize), ToolError> {
        let query = build_query(params)?;
        let limit = effective_limit(params.limit, self.max_results)?;
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ToolError::auth_configuration()
                .with_reason("RAPIDAPI_KEY is not set"));
        };

        let request = self
            .client
            .get(&*self.endpoint)
            .header("x-rapidapi-key", api_key)
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .query(&query);
        Ok((request, limit))
    }
}

fn transport_error(err: reqwest::Error) -> ToolError {
    let reason = if err.is_timeout() {
        format!("listings API timed out: {err}")
    } else {
        format!("listings API unreachable: {err}")
    };
    ToolError::transport().with_reason(reason)
}

impl Tool for PropertySearchTool {
    type Input = SearchParameters;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        r#"
Search for properties listed on Zillow by location.
By default the search returns residential properties for sale listed by agent,
newest listings first. Use `types` to pick the property types, `limit` to cap the
number of results and `filters` for any other query parameter of the listings API."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: SearchParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let search = self.search(input);
        async move {
            let results = search.await?;
            serde_json::to_string(&results).map_err(|err| {
                ToolError::upstream_schema().with_reason(err.to_string())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use realzen_agent_core::tool::ErrorKind;
    use serde_json::json;

    use super::*;
    use crate::ConfigurationBuilder;

    fn flags(query: &[(String, String)]) -> Vec<(&str, &str)> {
        query
            .iter()
            .filter(|(key, _)| key.starts_with("is"))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect()
    }

    #[test]
    fn test_default_query() {
        let query = build_query(&SearchParameters::new(" Austin, TX ")).unwrap();
        assert_eq!(query[0], ("location".to_owned(), "Austin, TX".to_owned()));
        assert_eq!(query[1], ("output".to_owned(), "json".to_owned()));
        assert_eq!(
            flags(&query),
            [
                ("isSingleFamily", "true"),
                ("isMultiFamily", "false"),
                ("isCondo", "false"),
                ("isTownhouse", "false"),
                ("isApartment", "false"),
                ("isLotLand", "false"),
                ("isManufactured", "false"),
            ]
        );
    }

    #[test]
    fn test_exactly_requested_flags() {
        let subsets: [&[PropertyType]; 4] = [
            &[],
            &[PropertyType::Condo, PropertyType::Townhouse],
            &[PropertyType::Manufactured, PropertyType::SingleFamily],
            &PropertyType::ALL,
        ];
        for subset in subsets {
            let params = SearchParameters::new("Denver, CO")
                .with_types(subset.iter().copied());
            let query = build_query(&params).unwrap();
            let flags = flags(&query);
            assert_eq!(flags.len(), PropertyType::ALL.len());
            for ty in PropertyType::ALL {
                let expected = if subset.contains(&ty) { "true" } else { "false" };
                assert!(flags.contains(&(ty.flag(), expected)), "{ty:?}");
            }
        }
    }

    #[test]
    fn test_filters() {
        let params = SearchParameters::new("Miami, FL")
            .with_filter("status_type", "ForRent");
        let query = build_query(&params).unwrap();
        assert_eq!(
            query.last(),
            Some(&("status_type".to_owned(), "ForRent".to_owned()))
        );

        for reserved in ["location", "output", "isCondo"] {
            let params =
                SearchParameters::new("Miami, FL").with_filter(reserved, "x");
            let err = build_query(&params).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{reserved}");
        }
    }

    #[test]
    fn test_empty_location() {
        let err = build_query(&SearchParameters::new("   ")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_effective_limit() {
        let max = NonZeroUsize::new(10).unwrap();
        assert_eq!(effective_limit(None, max).unwrap(), 10);
        assert_eq!(effective_limit(Some(3), max).unwrap(), 3);
        assert_eq!(effective_limit(Some(50), max).unwrap(), 10);
        assert_eq!(
            effective_limit(Some(0), max).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_truncation_keeps_order() {
        let body = json!({
            "results": (0..12).map(|zpid| json!({ "zpid": zpid })).collect::<Vec<_>>(),
            "totalResultCount": 12
        });
        let body = serde_json::to_vec(&body).unwrap();

        let results = extract_results(&body, 10).unwrap();
        assert_eq!(results.len(), 10);
        for (idx, record) in results.iter().enumerate() {
            assert_eq!(record["zpid"], idx);
        }

        let results = extract_results(&body, 20).unwrap();
        assert_eq!(results.len(), 12);
    }

    #[test]
    fn test_unexpected_bodies() {
        let bodies: [&[u8]; 4] =
            [b"<html>", b"[]", br#"{"results": {}}"#, br#"{"count": 0}"#];
        for body in bodies {
            let err = extract_results(body, 10).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::UpstreamSchema);
        }
    }

    #[test]
    fn test_parse_input() {
        let tool = PropertySearchTool::new(&Configuration::default()).unwrap();
        let input = tool
            .parse_input(json!({
                "location": "Austin, TX",
                "types": ["isCondo"],
                "limit": 5,
                "filters": { "status_type": "ForSale" }
            }))
            .unwrap();
        assert_eq!(input.types(), [PropertyType::Condo]);
        assert_eq!(input.limit, Some(5));
        assert_eq!(
            input.filters.as_ref().map(|filters| &filters["status_type"][..]),
            Some("ForSale")
        );

        let err = tool
            .parse_input(json!({ "location": "Austin, TX", "types": ["isCastle"] }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let tool = PropertySearchTool::new(&Configuration::default()).unwrap();
        let err = tool
            .parse_input(json!({
                "location": "Austin, TX",
                "status_type": "ForRent"
            }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(!err.is_fatal());

        // The same parameter is accepted as a filter.
        let input = tool
            .parse_input(json!({
                "location": "Austin, TX",
                "filters": { "status_type": "ForRent" }
            }))
            .unwrap();
        let query = build_query(&input).unwrap();
        assert!(query.contains(&("status_type".to_owned(), "ForRent".to_owned())));
    }

    #[test]
    fn test_null_means_missing() {
        let tool = PropertySearchTool::new(&Configuration::default()).unwrap();
        let input = tool
            .parse_input(json!({
                "location": "Austin, TX",
                "types": null,
                "limit": null,
                "filters": null
            }))
            .unwrap();
        assert_eq!(input, SearchParameters::new("Austin, TX"));
        assert_eq!(input.types(), [PropertyType::SingleFamily]);

        let query = build_query(&input).unwrap();
        assert_eq!(query.len(), 2 + PropertyType::ALL.len());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let config = ConfigurationBuilder::new().build();
        let tool = PropertySearchTool::new(&config).unwrap();
        let err = tool
            .search(SearchParameters::new("Austin, TX"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthConfiguration);
        assert!(err.is_fatal());
    }
}
