//! Explicit schema validation for request data.
//!
//! Every request model implements [`Schema`], reading a decoded JSON value
//! field by field through [`Fields`]. All field errors are collected before
//! failing, each one tagged with its location, a message and a type code.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Loc, ValidationErrors};

/// A model that can be built from untrusted JSON.
pub trait Schema: Sized {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors>;

    fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        Self::from_json_at(value, &Loc::body())
    }
}

impl<T: Schema> Schema for Vec<T> {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let Some(elements) = value.as_array() else {
            return Err(ValidationErrors::single(
                loc,
                "value is not a valid list",
                "type_error.list",
            ));
        };

        let mut errors = ValidationErrors::new();
        let mut out = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            match T::from_json_at(element, &loc.index(index)) {
                Ok(parsed) => out.push(parsed),
                Err(e) => errors.extend(e),
            }
        }
        errors.into_result(out)
    }
}

/// Type error for a single value: `(msg, type)`.
pub type Invalid = (String, &'static str);

fn invalid(msg: impl Into<String>, kind: &'static str) -> Invalid {
    (msg.into(), kind)
}

// =============================================================================
// Coercions
// =============================================================================

pub fn coerce_str(value: &Value) -> Result<String, Invalid> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid("str type expected", "type_error.str")),
    }
}

pub fn coerce_f64(value: &Value) -> Result<f64, Invalid> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .ok_or_else(|| invalid("value is not a valid float", "type_error.float"))
}

/// Whole and inside the `i64` range; `i64::MAX as f64` rounds up to 2^63.
fn is_whole_i64(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

pub fn coerce_i64(value: &Value) -> Result<i64, Invalid> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| is_whole_i64(*f)).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    };
    parsed.ok_or_else(|| invalid("value is not a valid integer", "type_error.integer"))
}

pub fn coerce_bool(value: &Value) -> Result<bool, Invalid> {
    let err = || invalid("value could not be parsed to a boolean", "type_error.bool");
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(err()),
        },
        Value::String(s) => parse_bool(s).ok_or_else(err),
        _ => Err(err()),
    }
}

/// Boolean spellings accepted from query strings and forms.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" | "t" | "y" => Some(true),
        "0" | "false" | "off" | "no" | "f" | "n" => Some(false),
        _ => None,
    }
}

pub fn coerce_uuid(value: &Value) -> Result<Uuid, Invalid> {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .ok_or_else(|| invalid("value is not a valid uuid", "type_error.uuid"))
}

/// RFC 3339 timestamps; naive timestamps are taken as UTC.
pub fn coerce_datetime(value: &Value) -> Result<DateTime<Utc>, Invalid> {
    let err = || invalid("invalid datetime format", "value_error.datetime");
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
                })
                .map_err(|_| err())
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(err),
        _ => Err(err()),
    }
}

pub fn coerce_time(value: &Value) -> Result<NaiveTime, Invalid> {
    let err = || invalid("invalid time format", "value_error.time");
    let s = value.as_str().ok_or_else(err)?.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| err())
}

/// Durations are given in (possibly fractional) seconds.
pub fn coerce_duration(value: &Value) -> Result<TimeDelta, Invalid> {
    let err = || invalid("invalid duration format", "value_error.duration");
    let secs = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
    .ok_or_else(err)?;

    TimeDelta::try_milliseconds((secs * 1000.0).round() as i64).ok_or_else(err)
}

pub fn coerce_email(value: &Value) -> Result<String, Invalid> {
    let err = || invalid("value is not a valid email address", "value_error.email");
    let raw = value.as_str().ok_or_else(err)?.trim();
    let (local, domain) = raw.split_once('@').ok_or_else(err)?;

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if local.is_empty() || local.contains(char::is_whitespace) || !domain_ok {
        return Err(err());
    }
    Ok(raw.to_string())
}

/// Absolute `http`/`https` URL with a non-empty host.
pub fn coerce_http_url(value: &Value) -> Result<String, Invalid> {
    let raw = value
        .as_str()
        .ok_or_else(|| invalid("str type expected", "type_error.str"))?
        .trim();

    let rest = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .ok_or_else(|| invalid("invalid or missing URL scheme", "value_error.url.scheme"))?;

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(invalid("URL host invalid", "value_error.url.host"));
    }
    Ok(raw.to_string())
}

// =============================================================================
// Constraints
// =============================================================================

pub fn check_ge(value: f64, bound: f64) -> Result<(), Invalid> {
    if value >= bound {
        Ok(())
    } else {
        Err(invalid(
            format!("ensure this value is greater than or equal to {}", fmt_num(bound)),
            "value_error.number.not_ge",
        ))
    }
}

pub fn check_gt(value: f64, bound: f64) -> Result<(), Invalid> {
    if value > bound {
        Ok(())
    } else {
        Err(invalid(
            format!("ensure this value is greater than {}", fmt_num(bound)),
            "value_error.number.not_gt",
        ))
    }
}

pub fn check_le(value: f64, bound: f64) -> Result<(), Invalid> {
    if value <= bound {
        Ok(())
    } else {
        Err(invalid(
            format!("ensure this value is less than or equal to {}", fmt_num(bound)),
            "value_error.number.not_le",
        ))
    }
}

pub fn check_lt(value: f64, bound: f64) -> Result<(), Invalid> {
    if value < bound {
        Ok(())
    } else {
        Err(invalid(
            format!("ensure this value is less than {}", fmt_num(bound)),
            "value_error.number.not_lt",
        ))
    }
}

pub fn check_min_length(value: &str, min: usize) -> Result<(), Invalid> {
    if value.chars().count() >= min {
        Ok(())
    } else {
        Err(invalid(
            format!("ensure this value has at least {min} characters"),
            "value_error.any_str.min_length",
        ))
    }
}

pub fn check_max_length(value: &str, max: usize) -> Result<(), Invalid> {
    if value.chars().count() <= max {
        Ok(())
    } else {
        Err(invalid(
            format!("ensure this value has at most {max} characters"),
            "value_error.any_str.max_length",
        ))
    }
}

/// Pattern of the form `^literal$`: the whole value must equal `literal`.
pub fn check_anchored_literal(value: &str, pattern: &str) -> Result<(), Invalid> {
    let literal = pattern.trim_start_matches('^').trim_end_matches('$');
    if value == literal {
        Ok(())
    } else {
        Err(invalid(
            format!("string does not match regex \"{pattern}\""),
            "value_error.str.regex",
        ))
    }
}

pub fn check_enum<'a>(value: &str, permitted: &[&'a str]) -> Result<&'a str, Invalid> {
    permitted.iter().copied().find(|p| *p == value).ok_or_else(|| {
        let listed = permitted
            .iter()
            .map(|p| format!("'{p}'"))
            .collect::<Vec<_>>()
            .join(", ");
        invalid(
            format!("value is not a valid enumeration member; permitted: {listed}"),
            "type_error.enum",
        )
    })
}

fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Fields reader
// =============================================================================

/// Reads the fields of one JSON object, collecting every error.
pub struct Fields<'a> {
    map: Option<&'a Map<String, Value>>,
    loc: Loc,
    errors: ValidationErrors,
}

impl<'a> Fields<'a> {
    /// Starts reading `value` as an object located at `loc`.
    pub fn new(value: &'a Value, loc: &Loc) -> Self {
        let mut errors = ValidationErrors::new();
        let map = value.as_object();
        if map.is_none() {
            errors.add(loc, "value is not a valid dict", "type_error.dict");
        }
        Self {
            map,
            loc: loc.clone(),
            errors,
        }
    }

    /// Wraps an already decoded object.
    pub fn from_map(map: &'a Map<String, Value>, loc: &Loc) -> Self {
        Self {
            map: Some(map),
            loc: loc.clone(),
            errors: ValidationErrors::new(),
        }
    }

    pub fn loc(&self) -> &Loc {
        &self.loc
    }

    /// Whether the key is present in the input at all (null included).
    pub fn is_set(&self, key: &str) -> bool {
        self.map.is_some_and(|m| m.contains_key(key))
    }

    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.map.and_then(|m| m.get(key))
    }

    pub fn add_error(&mut self, key: &str, (msg, kind): Invalid) {
        let loc = self.loc.key(key);
        self.errors.add(&loc, msg, kind);
    }

    /// Required field; reports missing or null values.
    pub fn required<T>(&mut self, key: &str, coerce: impl FnOnce(&Value) -> Result<T, Invalid>) -> Option<T> {
        if self.map.is_none() {
            return None;
        }
        match self.raw(key) {
            None => {
                self.add_error(key, invalid("field required", "value_error.missing"));
                None
            }
            Some(Value::Null) => {
                self.add_error(
                    key,
                    invalid("none is not an allowed value", "type_error.none.not_allowed"),
                );
                None
            }
            Some(value) => self.coerce(key, value, coerce),
        }
    }

    /// Optional field; missing and null both yield `None`.
    pub fn optional<T>(&mut self, key: &str, coerce: impl FnOnce(&Value) -> Result<T, Invalid>) -> Option<T> {
        match self.raw(key) {
            None | Some(Value::Null) => None,
            Some(value) => self.coerce(key, value, coerce),
        }
    }

    /// Checks a constraint on an already read value.
    pub fn check<T>(&mut self, key: &str, value: Option<T>, rule: impl FnOnce(&T) -> Result<(), Invalid>) -> Option<T> {
        let value = value?;
        match rule(&value) {
            Ok(()) => Some(value),
            Err(e) => {
                self.add_error(key, e);
                None
            }
        }
    }

    pub fn required_str(&mut self, key: &str) -> Option<String> {
        self.required(key, coerce_str)
    }

    pub fn optional_str(&mut self, key: &str) -> Option<String> {
        self.optional(key, coerce_str)
    }

    pub fn required_f64(&mut self, key: &str) -> Option<f64> {
        self.required(key, coerce_f64)
    }

    pub fn optional_f64(&mut self, key: &str) -> Option<f64> {
        self.optional(key, coerce_f64)
    }

    pub fn required_i64(&mut self, key: &str) -> Option<i64> {
        self.required(key, coerce_i64)
    }

    pub fn optional_bool(&mut self, key: &str) -> Option<bool> {
        self.optional(key, coerce_bool)
    }

    /// List of strings, defaulting to empty.
    pub fn str_list(&mut self, key: &str) -> Vec<String> {
        self.string_items(key, "value is not a valid list", "type_error.list")
            .unwrap_or_default()
    }

    /// Set of strings, deduplicated and ordered, defaulting to empty.
    pub fn str_set(&mut self, key: &str) -> BTreeSet<String> {
        self.string_items(key, "value is not a valid set", "type_error.set")
            .map(|items| items.into_iter().collect())
            .unwrap_or_default()
    }

    fn string_items(&mut self, key: &str, msg: &str, kind: &'static str) -> Option<Vec<String>> {
        let value = self.raw(key)?;
        if value.is_null() {
            return None;
        }
        let Some(elements) = value.as_array() else {
            self.add_error(key, invalid(msg, kind));
            return None;
        };

        let loc = self.loc.key(key);
        let mut out = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            match coerce_str(element) {
                Ok(s) => out.push(s),
                Err((msg, kind)) => self.errors.add(&loc.index(index), msg, kind),
            }
        }
        Some(out)
    }

    pub fn required_nested<T: Schema>(&mut self, key: &str) -> Option<T> {
        if self.map.is_none() {
            return None;
        }
        match self.raw(key) {
            None => {
                self.add_error(key, invalid("field required", "value_error.missing"));
                None
            }
            Some(Value::Null) => {
                self.add_error(
                    key,
                    invalid("none is not an allowed value", "type_error.none.not_allowed"),
                );
                None
            }
            Some(value) => self.nested(key, value),
        }
    }

    pub fn optional_nested<T: Schema>(&mut self, key: &str) -> Option<T> {
        match self.raw(key) {
            None | Some(Value::Null) => None,
            Some(value) => self.nested(key, value),
        }
    }

    fn nested<T: Schema>(&mut self, key: &str, value: &Value) -> Option<T> {
        match T::from_json_at(value, &self.loc.key(key)) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                self.errors.extend(e);
                None
            }
        }
    }

    fn coerce<T>(&mut self, key: &str, value: &Value, coerce: impl FnOnce(&Value) -> Result<T, Invalid>) -> Option<T> {
        match coerce(value) {
            Ok(v) => Some(v),
            Err(e) => {
                self.add_error(key, e);
                None
            }
        }
    }

    /// Ends the read. `build` runs only when no error was collected.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, ValidationErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        build().ok_or(self.errors)
    }
}

/// Reads a JSON object whose keys must parse as integers and values as floats.
pub fn int_keyed_weights(value: &Value, loc: &Loc) -> Result<BTreeMap<i64, f64>, ValidationErrors> {
    let Some(map) = value.as_object() else {
        return Err(ValidationErrors::single(loc, "value is not a valid dict", "type_error.dict"));
    };

    let mut errors = ValidationErrors::new();
    let mut out = BTreeMap::new();
    for (key, weight) in map {
        let parsed_key = key.trim().parse::<i64>();
        if parsed_key.is_err() {
            errors.add(
                &loc.key(key.as_str()).key("__key__"),
                "value is not a valid integer",
                "type_error.integer",
            );
        }
        let parsed_weight = coerce_f64(weight);
        if let Err((msg, kind)) = &parsed_weight {
            errors.add(&loc.key(key.as_str()), msg.clone(), *kind);
        }
        if let (Ok(k), Ok(w)) = (parsed_key, parsed_weight) {
            out.insert(k, w);
        }
    }
    errors.into_result(out)
}

// =============================================================================
// Raw parameter parsing (path, query, header, cookie)
// =============================================================================

/// Parses a textual parameter found at `loc` with a JSON coercion.
pub fn parse_param<T>(raw: &str, loc: &Loc, coerce: impl FnOnce(&Value) -> Result<T, Invalid>) -> Result<T, ValidationErrors> {
    coerce(&Value::String(raw.to_string()))
        .map_err(|(msg, kind)| ValidationErrors::single(loc, msg, kind))
}

pub fn path_i64(name: &str, raw: &str) -> Result<i64, ValidationErrors> {
    parse_param(raw, &Loc::root("path").key(name), coerce_i64)
}

/// Applies a constraint to a parameter value at `loc`.
pub fn constrain<T>(value: T, loc: &Loc, rule: impl FnOnce(&T) -> Result<(), Invalid>) -> Result<T, ValidationErrors> {
    rule(&value)
        .map(|()| value)
        .map_err(|(msg, kind)| ValidationErrors::single(loc, msg, kind))
}

/// Combines two results, keeping the errors of both.
pub fn both<A, B>(
    a: Result<A, ValidationErrors>,
    b: Result<B, ValidationErrors>,
) -> Result<(A, B), ValidationErrors> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (a, b) => {
            let mut errors = ValidationErrors::new();
            if let Err(e) = a {
                errors.extend(e);
            }
            if let Err(e) = b {
                errors.extend(e);
            }
            Err(errors)
        }
    }
}

pub fn all3<A, B, C>(
    a: Result<A, ValidationErrors>,
    b: Result<B, ValidationErrors>,
    c: Result<C, ValidationErrors>,
) -> Result<(A, B, C), ValidationErrors> {
    both(both(a, b), c).map(|((a, b), c)| (a, b, c))
}
