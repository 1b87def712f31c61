use serde_json::{json, Value};

/// Body of a single get-by-plate call. Built fresh for every blur.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRequest {
    pub license_plate: String,
    pub vehicle_type: Option<i64>,
    pub owner: Option<i64>,
}

impl LookupRequest {
    pub fn to_json(&self) -> Value {
        json!({
            "license_plate": self.license_plate,
            "vehicle_type": self.vehicle_type,
            "owner": self.owner,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: i64,
    pub license_plate: String,
    pub vehicle_type: Option<i64>,
    pub owner: Option<i64>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Vehicle {
    pub fn admin_url(&self) -> String {
        format!("/admin/vehicles/vehicle/{}/change/", self.id)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "vehicle_type": self.vehicle_type,
            "license_plate": self.license_plate,
            "brand": self.brand,
            "model": self.model,
            "color": self.color,
            "owner": self.owner,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
            "admin_url": self.admin_url(),
        })
    }
}
