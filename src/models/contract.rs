use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::validation::ValidationErrors;

/// Most images a single listing may carry.
pub const MAX_IMAGES: usize = 5;

pub const DEFAULT_QUANTITY_UNIT: &str = "kg";
pub const DEFAULT_AREA_UNIT: &str = "acres";

/// Listing fields in document order, with the label used in messages.
const FIELD_LABELS: &[(&str, &str)] = &[
    ("cropName", "Crop name"),
    ("cropVariety", "Crop variety"),
    ("cropCategory", "Crop category"),
    ("quantity", "Quantity"),
    ("quantityUnit", "Quantity unit"),
    ("expectedYieldDate", "Expected yield date"),
    ("sowingDate", "Sowing date"),
    ("address", "Address"),
    ("state", "State"),
    ("district", "District"),
    ("village", "Village"),
    ("pinCode", "Pin code"),
    ("farmArea", "Farm area"),
    ("areaUnit", "Area unit"),
    ("latitude", "Latitude"),
    ("longitude", "Longitude"),
    ("expectedPrice", "Expected price"),
    ("minPrice", "Minimum price"),
    ("requiresAdvance", "Requires advance"),
    ("advanceAmount", "Advance amount"),
    ("paymentMode", "Payment mode"),
    ("preferredBuyerType", "Preferred buyer type"),
    ("contractDuration", "Contract duration"),
    ("deliveryResponsibility", "Delivery responsibility"),
    ("deliveryLocation", "Delivery location"),
    ("penaltyClauses", "Penalty clauses"),
    ("images", "Images"),
    ("idProofDocument", "ID proof document"),
    ("landProofDocument", "Land proof document"),
    ("status", "Status"),
    ("allowVisibility", "Allow visibility"),
];

/// Keys that clients may send but never set directly: identity and
/// ownership are server-assigned, file references come from uploads.
const MANAGED_KEYS: &[&str] = &[
    "id",
    "_id",
    "createdBy",
    "createdAt",
    "updatedAt",
    "images",
    "idProof",
    "landProof",
    "idProofDocument",
    "landProofDocument",
];

/// Index of `field` in document order, `None` for keys that are not listing fields.
pub fn field_position(field: &str) -> Option<usize> {
    FIELD_LABELS.iter().position(|(key, _)| *key == field)
}

fn label(field: &'static str) -> &'static str {
    FIELD_LABELS
        .iter()
        .find(|(key, _)| *key == field)
        .map(|(_, label)| *label)
        .unwrap_or(field)
}

fn required_message(field: &'static str) -> String {
    format!("{} is required", label(field))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    #[default]
    Active,
    Pending,
    Completed,
    Cancelled,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 4] = [
        ContractStatus::Active,
        ContractStatus::Pending,
        ContractStatus::Completed,
        ContractStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "Active",
            ContractStatus::Pending => "Pending",
            ContractStatus::Completed => "Completed",
            ContractStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| "Status must be one of Active, Pending, Completed, Cancelled".to_string())
    }
}

/// A farmer's contract listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,

    // Crop
    pub crop_name: String,
    pub crop_variety: Option<String>,
    pub crop_category: String,
    pub quantity: f64,
    pub quantity_unit: String,
    pub expected_yield_date: NaiveDate,
    pub sowing_date: Option<NaiveDate>,

    // Location
    pub address: String,
    pub state: String,
    pub district: String,
    pub village: String,
    pub pin_code: String,
    pub farm_area: f64,
    pub area_unit: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,

    // Pricing
    pub expected_price: f64,
    pub min_price: f64,
    pub requires_advance: bool,
    pub advance_amount: Option<f64>,
    pub payment_mode: String,
    pub preferred_buyer_type: String,

    // Terms
    pub contract_duration: String,
    pub delivery_responsibility: String,
    pub delivery_location: String,
    pub penalty_clauses: Option<String>,

    // Media
    pub images: Vec<String>,
    pub id_proof_document: String,
    pub land_proof_document: Option<String>,

    pub status: ContractStatus,
    pub created_by: Uuid,
    pub allow_visibility: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Checks that hold for every stored listing.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let required_text: [(&'static str, &str); 15] = [
            ("cropName", &self.crop_name),
            ("cropCategory", &self.crop_category),
            ("address", &self.address),
            ("state", &self.state),
            ("district", &self.district),
            ("village", &self.village),
            ("pinCode", &self.pin_code),
            ("paymentMode", &self.payment_mode),
            ("preferredBuyerType", &self.preferred_buyer_type),
            ("contractDuration", &self.contract_duration),
            ("deliveryResponsibility", &self.delivery_responsibility),
            ("deliveryLocation", &self.delivery_location),
            ("idProofDocument", &self.id_proof_document),
            ("quantityUnit", &self.quantity_unit),
            ("areaUnit", &self.area_unit),
        ];
        for (field, value) in required_text {
            if value.trim().is_empty() {
                errors.push(field, required_message(field));
            }
        }

        if self.images.len() > MAX_IMAGES {
            errors.push("images", format!("At most {} images are allowed", MAX_IMAGES));
        }

        errors.into_result(())
    }
}

/// Parsed listing fields from one submission.
///
/// `None` means the field was not sent. `Some(None)` means it was sent
/// blank, which clears optional fields and fails required ones. Parse
/// failures travel with the patch and surface when it is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractPatch {
    pub crop_name: Option<Option<String>>,
    pub crop_variety: Option<Option<String>>,
    pub crop_category: Option<Option<String>>,
    pub quantity: Option<Option<f64>>,
    pub quantity_unit: Option<Option<String>>,
    pub expected_yield_date: Option<Option<NaiveDate>>,
    pub sowing_date: Option<Option<NaiveDate>>,
    pub address: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub district: Option<Option<String>>,
    pub village: Option<Option<String>>,
    pub pin_code: Option<Option<String>>,
    pub farm_area: Option<Option<f64>>,
    pub area_unit: Option<Option<String>>,
    pub latitude: Option<Option<String>>,
    pub longitude: Option<Option<String>>,
    pub expected_price: Option<Option<f64>>,
    pub min_price: Option<Option<f64>>,
    pub requires_advance: Option<bool>,
    pub advance_amount: Option<Option<f64>>,
    pub payment_mode: Option<Option<String>>,
    pub preferred_buyer_type: Option<Option<String>>,
    pub contract_duration: Option<Option<String>>,
    pub delivery_responsibility: Option<Option<String>>,
    pub delivery_location: Option<Option<String>>,
    pub penalty_clauses: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub id_proof_document: Option<String>,
    pub land_proof_document: Option<String>,
    pub status: Option<ContractStatus>,
    pub allow_visibility: Option<bool>,
    errors: ValidationErrors,
}

impl ContractPatch {
    /// Reads the text fields of a form submission.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Self {
        for key in fields.keys() {
            if field_position(key).is_none() && !MANAGED_KEYS.contains(&key.as_str()) {
                tracing::debug!("ignoring unknown listing field '{}'", key);
            }
        }

        let mut reader = FieldReader { fields, errors: ValidationErrors::new() };

        let mut patch = Self {
            crop_name: reader.text("cropName"),
            crop_variety: reader.text("cropVariety"),
            crop_category: reader.text("cropCategory"),
            quantity: reader.number("quantity"),
            quantity_unit: reader.text("quantityUnit"),
            expected_yield_date: reader.date("expectedYieldDate"),
            sowing_date: reader.date("sowingDate"),
            address: reader.text("address"),
            state: reader.text("state"),
            district: reader.text("district"),
            village: reader.text("village"),
            pin_code: reader.text("pinCode"),
            farm_area: reader.number("farmArea"),
            area_unit: reader.text("areaUnit"),
            latitude: reader.text("latitude"),
            longitude: reader.text("longitude"),
            expected_price: reader.number("expectedPrice"),
            min_price: reader.number("minPrice"),
            requires_advance: reader.boolean("requiresAdvance"),
            advance_amount: reader.number("advanceAmount"),
            payment_mode: reader.text("paymentMode"),
            preferred_buyer_type: reader.text("preferredBuyerType"),
            contract_duration: reader.text("contractDuration"),
            delivery_responsibility: reader.text("deliveryResponsibility"),
            delivery_location: reader.text("deliveryLocation"),
            penalty_clauses: reader.text("penaltyClauses"),
            images: None,
            id_proof_document: None,
            land_proof_document: None,
            status: reader.status("status"),
            allow_visibility: reader.boolean("allowVisibility"),
            errors: ValidationErrors::new(),
        };
        patch.errors = reader.errors;
        patch
    }

    /// Attaches stored upload references. Absent slots leave the listing's
    /// current references untouched.
    pub fn with_files(
        mut self,
        images: Option<Vec<String>>,
        id_proof_document: Option<String>,
        land_proof_document: Option<String>,
    ) -> Self {
        self.images = images;
        self.id_proof_document = id_proof_document;
        self.land_proof_document = land_proof_document;
        self
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Builds a new listing owned by `owner`, applying defaults.
    pub fn into_contract(self, owner: Uuid, now: DateTime<Utc>) -> Result<Contract, ValidationErrors> {
        let mut errors = self.errors;

        let crop_name = take_required(self.crop_name, "cropName", &mut errors);
        let crop_category = take_required(self.crop_category, "cropCategory", &mut errors);
        let quantity = take_required(self.quantity, "quantity", &mut errors);
        let expected_yield_date = take_required(self.expected_yield_date, "expectedYieldDate", &mut errors);
        let address = take_required(self.address, "address", &mut errors);
        let state = take_required(self.state, "state", &mut errors);
        let district = take_required(self.district, "district", &mut errors);
        let village = take_required(self.village, "village", &mut errors);
        let pin_code = take_required(self.pin_code, "pinCode", &mut errors);
        let farm_area = take_required(self.farm_area, "farmArea", &mut errors);
        let expected_price = take_required(self.expected_price, "expectedPrice", &mut errors);
        let min_price = take_required(self.min_price, "minPrice", &mut errors);
        let payment_mode = take_required(self.payment_mode, "paymentMode", &mut errors);
        let preferred_buyer_type = take_required(self.preferred_buyer_type, "preferredBuyerType", &mut errors);
        let contract_duration = take_required(self.contract_duration, "contractDuration", &mut errors);
        let delivery_responsibility =
            take_required(self.delivery_responsibility, "deliveryResponsibility", &mut errors);
        let delivery_location = take_required(self.delivery_location, "deliveryLocation", &mut errors);
        let id_proof_document = take_required(self.id_proof_document.map(Some), "idProofDocument", &mut errors);

        let (
            Some(crop_name),
            Some(crop_category),
            Some(quantity),
            Some(expected_yield_date),
            Some(address),
            Some(state),
            Some(district),
            Some(village),
            Some(pin_code),
            Some(farm_area),
            Some(expected_price),
            Some(min_price),
            Some(payment_mode),
            Some(preferred_buyer_type),
            Some(contract_duration),
            Some(delivery_responsibility),
            Some(delivery_location),
            Some(id_proof_document),
        ) = (
            crop_name,
            crop_category,
            quantity,
            expected_yield_date,
            address,
            state,
            district,
            village,
            pin_code,
            farm_area,
            expected_price,
            min_price,
            payment_mode,
            preferred_buyer_type,
            contract_duration,
            delivery_responsibility,
            delivery_location,
            id_proof_document,
        )
        else {
            return Err(errors);
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let contract = Contract {
            id: Uuid::new_v4(),
            crop_name,
            crop_variety: self.crop_variety.flatten(),
            crop_category,
            quantity,
            quantity_unit: self.quantity_unit.flatten().unwrap_or_else(|| DEFAULT_QUANTITY_UNIT.to_string()),
            expected_yield_date,
            sowing_date: self.sowing_date.flatten(),
            address,
            state,
            district,
            village,
            pin_code,
            farm_area,
            area_unit: self.area_unit.flatten().unwrap_or_else(|| DEFAULT_AREA_UNIT.to_string()),
            latitude: self.latitude.flatten(),
            longitude: self.longitude.flatten(),
            expected_price,
            min_price,
            requires_advance: self.requires_advance.unwrap_or(false),
            advance_amount: self.advance_amount.flatten(),
            payment_mode,
            preferred_buyer_type,
            contract_duration,
            delivery_responsibility,
            delivery_location,
            penalty_clauses: self.penalty_clauses.flatten(),
            images: self.images.unwrap_or_default(),
            id_proof_document,
            land_proof_document: self.land_proof_document,
            status: self.status.unwrap_or_default(),
            created_by: owner,
            allow_visibility: self.allow_visibility.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        contract.validate()?;
        Ok(contract)
    }

    /// Merges the patch into `contract` and re-validates the result.
    /// Ownership and identity are never touched.
    pub fn apply(self, contract: &mut Contract, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut errors = self.errors;

        set_required(&mut contract.crop_name, self.crop_name, "cropName", &mut errors);
        set_optional(&mut contract.crop_variety, self.crop_variety);
        set_required(&mut contract.crop_category, self.crop_category, "cropCategory", &mut errors);
        set_required(&mut contract.quantity, self.quantity, "quantity", &mut errors);
        set_defaulted(&mut contract.quantity_unit, self.quantity_unit, DEFAULT_QUANTITY_UNIT);
        set_required(&mut contract.expected_yield_date, self.expected_yield_date, "expectedYieldDate", &mut errors);
        set_optional(&mut contract.sowing_date, self.sowing_date);
        set_required(&mut contract.address, self.address, "address", &mut errors);
        set_required(&mut contract.state, self.state, "state", &mut errors);
        set_required(&mut contract.district, self.district, "district", &mut errors);
        set_required(&mut contract.village, self.village, "village", &mut errors);
        set_required(&mut contract.pin_code, self.pin_code, "pinCode", &mut errors);
        set_required(&mut contract.farm_area, self.farm_area, "farmArea", &mut errors);
        set_defaulted(&mut contract.area_unit, self.area_unit, DEFAULT_AREA_UNIT);
        set_optional(&mut contract.latitude, self.latitude);
        set_optional(&mut contract.longitude, self.longitude);
        set_required(&mut contract.expected_price, self.expected_price, "expectedPrice", &mut errors);
        set_required(&mut contract.min_price, self.min_price, "minPrice", &mut errors);
        set_optional(&mut contract.advance_amount, self.advance_amount);
        set_required(&mut contract.payment_mode, self.payment_mode, "paymentMode", &mut errors);
        set_required(&mut contract.preferred_buyer_type, self.preferred_buyer_type, "preferredBuyerType", &mut errors);
        set_required(&mut contract.contract_duration, self.contract_duration, "contractDuration", &mut errors);
        set_required(
            &mut contract.delivery_responsibility,
            self.delivery_responsibility,
            "deliveryResponsibility",
            &mut errors,
        );
        set_required(&mut contract.delivery_location, self.delivery_location, "deliveryLocation", &mut errors);
        set_optional(&mut contract.penalty_clauses, self.penalty_clauses);

        if let Some(value) = self.requires_advance {
            contract.requires_advance = value;
        }
        if let Some(value) = self.allow_visibility {
            contract.allow_visibility = value;
        }
        if let Some(status) = self.status {
            contract.status = status;
        }
        if let Some(images) = self.images {
            contract.images = images;
        }
        if let Some(path) = self.id_proof_document {
            contract.id_proof_document = path;
        }
        if let Some(path) = self.land_proof_document {
            contract.land_proof_document = Some(path);
        }

        if let Err(invalid) = contract.validate() {
            errors.merge(invalid);
        }
        contract.updated_at = now;

        errors.into_result(())
    }
}

fn take_required<T>(value: Option<Option<T>>, field: &'static str, errors: &mut ValidationErrors) -> Option<T> {
    match value.flatten() {
        Some(v) => Some(v),
        None => {
            errors.push(field, required_message(field));
            None
        }
    }
}

fn set_required<T>(slot: &mut T, value: Option<Option<T>>, field: &'static str, errors: &mut ValidationErrors) {
    match value {
        Some(Some(v)) => *slot = v,
        Some(None) => errors.push(field, required_message(field)),
        None => {}
    }
}

fn set_optional<T>(slot: &mut Option<T>, value: Option<Option<T>>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn set_defaulted(slot: &mut String, value: Option<Option<String>>, default: &str) {
    if let Some(v) = value {
        *slot = v.unwrap_or_else(|| default.to_string());
    }
}

/// Typed access to raw form values, collecting parse failures.
struct FieldReader<'a> {
    fields: &'a BTreeMap<String, String>,
    errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    fn raw(&self, field: &'static str) -> Option<Option<&'a str>> {
        let fields = self.fields;
        fields.get(field).map(|v| Some(v.trim()).filter(|v| !v.is_empty()))
    }

    fn text(&mut self, field: &'static str) -> Option<Option<String>> {
        self.raw(field).map(|v| v.map(str::to_string))
    }

    fn number(&mut self, field: &'static str) -> Option<Option<f64>> {
        let value = self.raw(field)?;
        match value.map(str::parse::<f64>) {
            None => Some(None),
            Some(Ok(n)) if n.is_finite() => Some(Some(n)),
            Some(_) => {
                self.errors.push(field, format!("{} must be a number", label(field)));
                None
            }
        }
    }

    fn date(&mut self, field: &'static str) -> Option<Option<NaiveDate>> {
        let value = self.raw(field)?;
        match value.map(parse_date) {
            None => Some(None),
            Some(Some(date)) => Some(Some(date)),
            Some(None) => {
                self.errors.push(field, format!("{} must be a date (YYYY-MM-DD)", label(field)));
                None
            }
        }
    }

    fn boolean(&mut self, field: &'static str) -> Option<bool> {
        let value = self.raw(field)??;
        match value.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Some(true),
            "false" | "off" | "no" | "0" => Some(false),
            _ => {
                self.errors.push(field, format!("{} must be true or false", label(field)));
                None
            }
        }
    }

    fn status(&mut self, field: &'static str) -> Option<ContractStatus> {
        let value = self.raw(field)??;
        match value.parse() {
            Ok(status) => Some(status),
            Err(message) => {
                self.errors.push(field, message);
                None
            }
        }
    }
}

/// Accepts a calendar date or a full RFC 3339 timestamp.
fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}
