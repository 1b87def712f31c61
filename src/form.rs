use std::sync::Arc;

/// A form control whose current value can be read. The license plate input
/// and both selects are reached through this.
pub trait FormField: Send + Sync {
    fn value(&self) -> String;
}

/// Fixed-value field, used by terminal mode and tests.
#[derive(Debug, Clone)]
pub struct StaticField(pub String);

impl FormField for StaticField {
    fn value(&self) -> String {
        self.0.clone()
    }
}

/// The vehicle form as the lookup sees it. Any field may be absent
/// depending on which page variant is rendered.
#[derive(Clone, Default)]
pub struct VehicleForm {
    pub license_plate: Option<Arc<dyn FormField>>,
    pub vehicle_type: Option<Arc<dyn FormField>>,
    pub owner: Option<Arc<dyn FormField>>,
}

impl VehicleForm {
    pub fn plate(&self) -> Option<String> {
        self.license_plate
            .as_ref()
            .map(|field| field.value().trim().to_string())
            .filter(|plate| !plate.is_empty())
    }

    pub fn vehicle_type_id(&self) -> Option<i64> {
        selection(&self.vehicle_type)
    }

    pub fn owner_id(&self) -> Option<i64> {
        selection(&self.owner)
    }
}

fn selection(field: &Option<Arc<dyn FormField>>) -> Option<i64> {
    field.as_ref().and_then(|f| parse_id(&f.value()))
}

/// Leading-digits integer parse; a `0x` prefix switches to hex. Nothing
/// numeric, overflow, and zero (the empty select option's id) all give
/// `None`.
pub fn parse_id(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, rest) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let (radix, digits) = if rest.starts_with("0x") || rest.starts_with("0X") {
        (16, &rest[2..])
    } else {
        (10, rest)
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or_else(|| digits.len());
    let n = i64::from_str_radix(&digits[..end], radix).ok()?;
    let n = if negative { -n } else { n };
    if n == 0 {
        None
    } else {
        Some(n)
    }
}
