use uuid::Uuid;

use super::error::FilterError;
use crate::models::{Contract, ContractStatus};

/// Listing columns that accept exact-match filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    CropName,
    CropCategory,
    CropVariety,
    State,
    District,
    Village,
    PinCode,
    Status,
    PaymentMode,
    PreferredBuyerType,
}

impl Column {
    fn from_param(param: &str) -> Option<Self> {
        Some(match param {
            "cropName" => Column::CropName,
            "cropCategory" => Column::CropCategory,
            "cropVariety" => Column::CropVariety,
            "state" => Column::State,
            "district" => Column::District,
            "village" => Column::Village,
            "pinCode" => Column::PinCode,
            "status" => Column::Status,
            "paymentMode" => Column::PaymentMode,
            "preferredBuyerType" => Column::PreferredBuyerType,
            _ => return None,
        })
    }

    fn sql_name(self) -> &'static str {
        match self {
            Column::CropName => "crop_name",
            Column::CropCategory => "crop_category",
            Column::CropVariety => "crop_variety",
            Column::State => "state",
            Column::District => "district",
            Column::Village => "village",
            Column::PinCode => "pin_code",
            Column::Status => "status",
            Column::PaymentMode => "payment_mode",
            Column::PreferredBuyerType => "preferred_buyer_type",
        }
    }

    fn value_of(self, contract: &Contract) -> Option<&str> {
        match self {
            Column::CropName => Some(&contract.crop_name),
            Column::CropCategory => Some(&contract.crop_category),
            Column::CropVariety => contract.crop_variety.as_deref(),
            Column::State => Some(&contract.state),
            Column::District => Some(&contract.district),
            Column::Village => Some(&contract.village),
            Column::PinCode => Some(&contract.pin_code),
            Column::Status => Some(contract.status.as_str()),
            Column::PaymentMode => Some(&contract.payment_mode),
            Column::PreferredBuyerType => Some(&contract.preferred_buyer_type),
        }
    }
}

/// Bind values for a rendered WHERE clause, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    TextList(Vec<String>),
    Number(f64),
    Uuid(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlWhere {
    pub clause: String,
    pub params: Vec<SqlParam>,
}

/// Allow-listed listing query.
///
/// Repeated exact-match parameters widen the match (`state=A&state=B`
/// matches either). All conditions are combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractFilter {
    equals: Vec<(Column, Vec<String>)>,
    created_by: Option<Uuid>,
    search: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
}

impl ContractFilter {
    /// Builds a filter from raw query pairs. `caller` resolves `mine=true`.
    pub fn from_pairs(pairs: &[(String, String)], caller: Uuid) -> Result<Self, FilterError> {
        let mut filter = Self::default();
        let mut mine = false;

        for (key, raw) in pairs {
            let value = raw.trim();

            if let Some(column) = Column::from_param(key) {
                if value.is_empty() {
                    continue;
                }
                let value = if column == Column::Status {
                    value
                        .parse::<ContractStatus>()
                        .map_err(|_| FilterError::InvalidValue {
                            param: "status",
                            value: value.to_string(),
                            expected: "one of Active, Pending, Completed, Cancelled",
                        })?
                        .as_str()
                        .to_string()
                } else {
                    value.to_string()
                };
                filter.push_equal(column, value);
                continue;
            }

            match key.as_str() {
                "search" => {
                    if value.is_empty() {
                        continue;
                    }
                    set_once(&mut filter.search, value.to_string(), "search")?;
                }
                "minPrice" => {
                    if value.is_empty() {
                        continue;
                    }
                    set_once(&mut filter.min_price, parse_price("minPrice", value)?, "minPrice")?;
                }
                "maxPrice" => {
                    if value.is_empty() {
                        continue;
                    }
                    set_once(&mut filter.max_price, parse_price("maxPrice", value)?, "maxPrice")?;
                }
                "createdBy" => {
                    if value.is_empty() {
                        continue;
                    }
                    let owner = Uuid::parse_str(value).map_err(|_| FilterError::InvalidValue {
                        param: "createdBy",
                        value: value.to_string(),
                        expected: "a user id",
                    })?;
                    if filter.created_by.is_some_and(|existing| existing != owner) {
                        return Err(FilterError::Repeated("createdBy"));
                    }
                    filter.created_by = Some(owner);
                }
                "mine" => match value.to_ascii_lowercase().as_str() {
                    "" | "false" | "0" => {}
                    "true" | "1" => mine = true,
                    _ => {
                        return Err(FilterError::InvalidValue {
                            param: "mine",
                            value: value.to_string(),
                            expected: "true or false",
                        })
                    }
                },
                other => return Err(FilterError::UnknownParameter(other.to_string())),
            }
        }

        if mine {
            match filter.created_by {
                Some(owner) if owner != caller => return Err(FilterError::ConflictingOwner),
                _ => filter.created_by = Some(caller),
            }
        }

        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
            && self.created_by.is_none()
            && self.search.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    fn push_equal(&mut self, column: Column, value: String) {
        match self.equals.iter_mut().find(|(c, _)| *c == column) {
            Some((_, values)) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            None => self.equals.push((column, vec![value])),
        }
    }

    /// Renders a parameterized WHERE clause (`$1`, `$2`, ...).
    pub fn to_sql(&self) -> SqlWhere {
        let mut params = Vec::new();
        let mut conditions = Vec::new();

        let mut param = |value: SqlParam| {
            params.push(value);
            format!("${}", params.len())
        };

        for (column, values) in &self.equals {
            let condition = match values.as_slice() {
                [single] => format!("\"{}\" = {}", column.sql_name(), param(SqlParam::Text(single.clone()))),
                many => format!(
                    "\"{}\" = ANY({})",
                    column.sql_name(),
                    param(SqlParam::TextList(many.to_vec()))
                ),
            };
            conditions.push(condition);
        }

        if let Some(owner) = self.created_by {
            conditions.push(format!("\"created_by\" = {}", param(SqlParam::Uuid(owner))));
        }

        if let Some(search) = &self.search {
            let placeholder = param(SqlParam::Text(format!("%{}%", escape_like(search))));
            conditions.push(format!(
                "(\"crop_name\" ILIKE {p} OR \"crop_variety\" ILIKE {p} OR \"crop_category\" ILIKE {p})",
                p = placeholder
            ));
        }

        if let Some(min) = self.min_price {
            conditions.push(format!("\"expected_price\" >= {}", param(SqlParam::Number(min))));
        }
        if let Some(max) = self.max_price {
            conditions.push(format!("\"expected_price\" <= {}", param(SqlParam::Number(max))));
        }

        let clause = if conditions.is_empty() { "1=1".to_string() } else { conditions.join(" AND ") };
        SqlWhere { clause, params }
    }

    /// Evaluates the filter against a listing held in memory.
    pub fn matches(&self, contract: &Contract) -> bool {
        let equals_ok = self.equals.iter().all(|(column, values)| {
            column
                .value_of(contract)
                .is_some_and(|actual| values.iter().any(|v| v == actual))
        });
        if !equals_ok {
            return false;
        }

        if self.created_by.is_some_and(|owner| owner != contract.created_by) {
            return false;
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = [Some(&contract.crop_name), contract.crop_variety.as_ref(), Some(&contract.crop_category)]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if self.min_price.is_some_and(|min| contract.expected_price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| contract.expected_price > max) {
            return false;
        }

        true
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, param: &'static str) -> Result<(), FilterError> {
    if slot.is_some() {
        return Err(FilterError::Repeated(param));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_price(param: &'static str, value: &str) -> Result<f64, FilterError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FilterError::InvalidValue {
            param,
            value: value.to_string(),
            expected: "a number",
        })
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn empty_query_matches_everything() {
        let filter = ContractFilter::from_pairs(&[], Uuid::new_v4()).unwrap();
        assert!(filter.is_empty());
        assert_eq!(filter.to_sql(), SqlWhere { clause: "1=1".into(), params: vec![] });
    }

    #[test]
    fn renders_equality_and_ranges() {
        let filter = ContractFilter::from_pairs(
            &pairs(&[("state", "Punjab"), ("status", "active"), ("minPrice", "1000"), ("maxPrice", "2500")]),
            Uuid::new_v4(),
        )
        .unwrap();

        let sql = filter.to_sql();
        assert_eq!(
            sql.clause,
            "\"state\" = $1 AND \"status\" = $2 AND \"expected_price\" >= $3 AND \"expected_price\" <= $4"
        );
        assert_eq!(
            sql.params,
            vec![
                SqlParam::Text("Punjab".into()),
                SqlParam::Text("Active".into()),
                SqlParam::Number(1000.0),
                SqlParam::Number(2500.0),
            ]
        );
    }

    #[test]
    fn repeated_values_become_any() {
        let filter = ContractFilter::from_pairs(
            &pairs(&[("cropName", "Wheat"), ("cropName", "Rice")]),
            Uuid::new_v4(),
        )
        .unwrap();
        let sql = filter.to_sql();
        assert_eq!(sql.clause, "\"crop_name\" = ANY($1)");
        assert_eq!(sql.params, vec![SqlParam::TextList(vec!["Wheat".into(), "Rice".into()])]);
    }

    #[test]
    fn search_reuses_one_placeholder_and_escapes_wildcards() {
        let filter = ContractFilter::from_pairs(&pairs(&[("search", "50%_off")]), Uuid::new_v4()).unwrap();
        let sql = filter.to_sql();
        assert_eq!(sql.clause.matches("$1").count(), 3);
        assert_eq!(sql.params, vec![SqlParam::Text("%50\\%\\_off%".into())]);
    }

    #[test]
    fn mine_resolves_to_caller() {
        let caller = Uuid::new_v4();
        let filter = ContractFilter::from_pairs(&pairs(&[("mine", "true")]), caller).unwrap();
        assert_eq!(filter.to_sql().params, vec![SqlParam::Uuid(caller)]);

        let other = Uuid::new_v4().to_string();
        assert_eq!(
            ContractFilter::from_pairs(&pairs(&[("mine", "true"), ("createdBy", &other)]), caller),
            Err(FilterError::ConflictingOwner)
        );
    }

    #[test]
    fn empty_values_are_ignored() {
        let filter =
            ContractFilter::from_pairs(&pairs(&[("state", ""), ("search", "  "), ("minPrice", "")]), Uuid::new_v4())
                .unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn rejects_unknown_and_malformed_parameters() {
        let caller = Uuid::new_v4();
        assert_eq!(
            ContractFilter::from_pairs(&pairs(&[("$where", "1")]), caller),
            Err(FilterError::UnknownParameter("$where".into()))
        );
        assert!(matches!(
            ContractFilter::from_pairs(&pairs(&[("minPrice", "cheap")]), caller),
            Err(FilterError::InvalidValue { param: "minPrice", .. })
        ));
        assert!(matches!(
            ContractFilter::from_pairs(&pairs(&[("status", "Archived")]), caller),
            Err(FilterError::InvalidValue { param: "status", .. })
        ));
        assert!(matches!(
            ContractFilter::from_pairs(&pairs(&[("createdBy", "someone")]), caller),
            Err(FilterError::InvalidValue { param: "createdBy", .. })
        ));
        assert_eq!(
            ContractFilter::from_pairs(&pairs(&[("search", "a"), ("search", "b")]), caller),
            Err(FilterError::Repeated("search"))
        );
    }
}
