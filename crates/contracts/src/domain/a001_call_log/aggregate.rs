use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Имя абонента, если клиент его не передал
pub const DEFAULT_NAME: &str = "Unknown";

// ============================================================================
// Record
// ============================================================================

/// Запись журнала звонков, прошедшая валидацию
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLogRecord {
    #[serde(rename = "dateTime")]
    pub date_time: String,

    /// Длительность в секундах
    #[serde(serialize_with = "serialize_duration")]
    pub duration: f64,

    pub name: String,

    #[serde(rename = "phoneNumber")]
    pub phone_number: String,

    /// Направление/категория звонка (incoming, outgoing, missed, ...)
    #[serde(rename = "type")]
    pub call_type: String,
}

impl CallLogRecord {
    /// Ключ дедупликации как пара (phoneNumber, dateTime)
    pub fn key_pair(&self) -> (String, String) {
        (self.phone_number.clone(), self.date_time.clone())
    }
}

/// Целые значения отдаём как целые: `30`, а не `30.0`
fn serialize_duration<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

// ============================================================================
// DTO
// ============================================================================

/// Сырая запись в том виде, в котором её прислало устройство.
///
/// Поля не типизированы: приведение и проверка выполняются в [`CallLogDto::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallLogDto {
    #[serde(rename = "dateTime", default)]
    pub date_time: Option<Value>,

    #[serde(default)]
    pub duration: Option<Value>,

    #[serde(default)]
    pub name: Option<Value>,

    #[serde(rename = "phoneNumber", default)]
    pub phone_number: Option<Value>,

    #[serde(rename = "type", default)]
    pub call_type: Option<Value>,
}

impl CallLogDto {
    /// Валидация и приведение типов
    pub fn validate(&self) -> Result<CallLogRecord, String> {
        let date_time = required_string("dateTime", &self.date_time)?;
        let duration = required_number("duration", &self.duration)?;
        let phone_number = required_string("phoneNumber", &self.phone_number)?;
        let call_type = required_string("type", &self.call_type)?;
        let name = match &self.name {
            None | Some(Value::Null) => DEFAULT_NAME.to_string(),
            Some(v) => coerce_string("name", v)?,
        };

        Ok(CallLogRecord {
            date_time,
            duration,
            name,
            phone_number,
            call_type,
        })
    }
}

fn required_string(field: &str, value: &Option<Value>) -> Result<String, String> {
    match value {
        None | Some(Value::Null) => Err(format!("Path `{}` is required.", field)),
        Some(v) => coerce_string(field, v),
    }
}

fn coerce_string(field: &str, value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        // 5551234.0 -> "5551234", как при обычном приведении числа к строке
        Value::Number(n) => Ok(match n.as_f64() {
            Some(f) if n.is_f64() => f.to_string(),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(format!("Cast to string failed for path `{}`", field)),
    }
}

fn required_number(field: &str, value: &Option<Value>) -> Result<f64, String> {
    let parsed = match value {
        None | Some(Value::Null) => return Err(format!("Path `{}` is required.", field)),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("Cast to Number failed for path `{}`", field))
}
