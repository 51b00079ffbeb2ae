//! Scalar configuration parameters.

use crate::core::TypeKey;
use crate::error::{ContainerError, Result};
use serde::Serialize;
use serde_json::Value as Document;
use std::collections::HashMap;
use std::fmt;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
  Text(String),
  Integer(i64),
  Real(f64),
}

impl Scalar {
  /// The Rust type a constructor parameter must declare to receive this value.
  pub fn type_key(&self) -> TypeKey {
    match self {
      Scalar::Text(_) => TypeKey::of::<String>(),
      Scalar::Integer(_) => TypeKey::of::<i64>(),
      Scalar::Real(_) => TypeKey::of::<f64>(),
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Scalar::Text(_) => "text",
      Scalar::Integer(_) => "integer",
      Scalar::Real(_) => "real",
    }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Scalar::Text(text) => Some(text),
      _ => None,
    }
  }

  pub fn as_integer(&self) -> Option<i64> {
    match self {
      Scalar::Integer(number) => Some(*number),
      _ => None,
    }
  }

  pub fn as_real(&self) -> Option<f64> {
    match self {
      Scalar::Real(number) => Some(*number),
      _ => None,
    }
  }
}

impl fmt::Display for Scalar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scalar::Text(text) => write!(f, "{:?}", text),
      Scalar::Integer(number) => write!(f, "{}", number),
      Scalar::Real(number) => write!(f, "{}", number),
    }
  }
}

impl From<String> for Scalar {
  fn from(text: String) -> Self {
    Scalar::Text(text)
  }
}

impl From<&str> for Scalar {
  fn from(text: &str) -> Self {
    Scalar::Text(text.to_owned())
  }
}

impl From<i64> for Scalar {
  fn from(number: i64) -> Self {
    Scalar::Integer(number)
  }
}

impl From<i32> for Scalar {
  fn from(number: i32) -> Self {
    Scalar::Integer(number.into())
  }
}

impl From<f64> for Scalar {
  fn from(number: f64) -> Self {
    Scalar::Real(number)
  }
}

/// The flat, read-only set of scalar parameters a container is created with.
///
/// It can be built from a map, from any serializable configuration struct, or
/// parsed from a YAML or JSON document. All of them end up as the same map of
/// name to [`Scalar`]; nested values are rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
  values: HashMap<String, Scalar>,
}

impl Parameters {
  pub fn new() -> Self {
    Self::default()
  }

  /// Flattens an already typed configuration object.
  ///
  /// ```
  /// use serde::Serialize;
  /// use weft_ioc::{Parameters, Scalar};
  ///
  /// #[derive(Serialize)]
  /// struct AppConfig {
  ///   database_url: String,
  ///   pool_size: i64,
  /// }
  ///
  /// let params = Parameters::from_serializable(&AppConfig {
  ///   database_url: "postgres://localhost/app".to_string(),
  ///   pool_size: 8,
  /// })
  /// .unwrap();
  ///
  /// assert_eq!(params.get("pool_size").unwrap(), &Scalar::Integer(8));
  /// ```
  pub fn from_serializable<T: Serialize + ?Sized>(config: &T) -> Result<Self> {
    let document =
      serde_json::to_value(config).map_err(|e| ContainerError::ConfigParse(e.to_string()))?;
    Self::from_document(document)
  }

  pub fn from_json_str(source: &str) -> Result<Self> {
    let document: Document =
      serde_json::from_str(source).map_err(|e| ContainerError::ConfigParse(e.to_string()))?;
    Self::from_document(document)
  }

  pub fn from_yaml_str(source: &str) -> Result<Self> {
    let document: Document =
      serde_yaml::from_str(source).map_err(|e| ContainerError::ConfigParse(e.to_string()))?;
    Self::from_document(document)
  }

  fn from_document(document: Document) -> Result<Self> {
    let entries = match document {
      Document::Object(entries) => entries,
      Document::Null => return Ok(Self::new()),
      other => {
        return Err(ContainerError::ConfigParse(format!(
          "expected a mapping of parameters, found {}",
          other
        )))
      }
    };

    let mut values = HashMap::with_capacity(entries.len());
    for (name, value) in entries {
      let scalar = scalar_from_document(&name, value)?;
      values.insert(name, scalar);
    }
    Ok(Self { values })
  }

  pub fn get(&self, name: &str) -> Result<&Scalar> {
    self
      .values
      .get(name)
      .ok_or_else(|| ContainerError::UnknownParameter(name.to_owned()))
  }

  pub fn has(&self, name: &str) -> bool {
    self.values.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
    self.values.iter().map(|(name, value)| (name.as_str(), value))
  }
}

fn scalar_from_document(name: &str, value: Document) -> Result<Scalar> {
  match value {
    Document::String(text) => Ok(Scalar::Text(text)),
    Document::Number(number) => {
      if let Some(integer) = number.as_i64() {
        Ok(Scalar::Integer(integer))
      } else if number.is_f64() {
        // `is_f64` guarantees the conversion succeeds.
        Ok(Scalar::Real(number.as_f64().unwrap_or_default()))
      } else {
        Err(ContainerError::UnsupportedParameter {
          name: name.to_owned(),
          found: format!("integer {} is out of range", number),
        })
      }
    }
    other => Err(ContainerError::UnsupportedParameter {
      name: name.to_owned(),
      found: other.to_string(),
    }),
  }
}

impl From<HashMap<String, Scalar>> for Parameters {
  fn from(values: HashMap<String, Scalar>) -> Self {
    Self { values }
  }
}

impl<K: Into<String>, V: Into<Scalar>> FromIterator<(K, V)> for Parameters {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Self {
      values: iter
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect(),
    }
  }
}
