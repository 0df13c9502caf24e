//! Filter tree produced by the CQL parser.
//!
//! The tree mirrors the filter model used by SLD rules: comparisons on a property, logical
//! combinations of other filters and spatial predicates over a geometry property. Leaves are
//! literals, bare property names and WKT geometries.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A node of the filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterNode {
    Comparison(Comparison),
    Logical(Logical),
    Spatial(Spatial),
    Literal(Literal),
    /// An unresolved attribute name. Resolving it against a schema is up to the caller.
    Property(String),
    Geometry(Geometry),
}

impl FilterNode {
    /// A short description of the node's shape, used in error messages.
    pub fn describe(&self) -> String {
        match self {
            FilterNode::Comparison(comparison) => {
                format!("{} comparison", comparison.comparison_type().name())
            }
            FilterNode::Logical(logical) => format!("{} filter", logical.op.name()),
            FilterNode::Spatial(spatial) => format!("{} filter", spatial.op.name()),
            FilterNode::Literal(Literal::Number(n)) => format!("number {n}"),
            FilterNode::Literal(Literal::String(s)) => format!("string '{s}'"),
            FilterNode::Property(name) => format!("property {name}"),
            FilterNode::Geometry(geometry) => format!("{} geometry", geometry.kind.name()),
        }
    }

    /// Returns the property name if this node is a bare property.
    pub fn as_property(&self) -> Option<&str> {
        match self {
            FilterNode::Property(name) => Some(name),
            _ => None,
        }
    }
}

impl From<Comparison> for FilterNode {
    fn from(comparison: Comparison) -> Self {
        FilterNode::Comparison(comparison)
    }
}

impl From<Logical> for FilterNode {
    fn from(logical: Logical) -> Self {
        FilterNode::Logical(logical)
    }
}

impl From<Spatial> for FilterNode {
    fn from(spatial: Spatial) -> Self {
        FilterNode::Spatial(spatial)
    }
}

impl From<Literal> for FilterNode {
    fn from(literal: Literal) -> Self {
        FilterNode::Literal(literal)
    }
}

impl From<Geometry> for FilterNode {
    fn from(geometry: Geometry) -> Self {
        FilterNode::Geometry(geometry)
    }
}

/// A literal value: a decimal number or an unescaped string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Number(f64),
    String(String),
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Number(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

/// A comparison on a property. Each variant carries exactly the operands its type needs.
///
/// Serialized flat, with the full [`ComparisonType`] as `type`:
/// `{"type": "BETWEEN", "property": ..., "lowerBoundary": 1.0, "upperBoundary": 10.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ComparisonRepr", try_from = "ComparisonRepr")]
pub enum Comparison {
    /// `property <op> value`
    Binary {
        op: ComparisonOperator,
        property: Box<FilterNode>,
        value: Box<FilterNode>,
    },
    /// `property BETWEEN lower AND upper`
    Between {
        property: Box<FilterNode>,
        lower: Literal,
        upper: Literal,
    },
    /// `property IS NULL`
    IsNull { property: Box<FilterNode> },
}

#[derive(Serialize, Deserialize)]
struct ComparisonRepr {
    #[serde(rename = "type")]
    kind: ComparisonType,
    property: Box<FilterNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Box<FilterNode>>,
    #[serde(rename = "lowerBoundary", default, skip_serializing_if = "Option::is_none")]
    lower: Option<Literal>,
    #[serde(rename = "upperBoundary", default, skip_serializing_if = "Option::is_none")]
    upper: Option<Literal>,
}

impl From<Comparison> for ComparisonRepr {
    fn from(comparison: Comparison) -> Self {
        let kind = comparison.comparison_type();
        match comparison {
            Comparison::Binary {
                property, value, ..
            } => ComparisonRepr {
                kind,
                property,
                value: Some(value),
                lower: None,
                upper: None,
            },
            Comparison::Between {
                property,
                lower,
                upper,
            } => ComparisonRepr {
                kind,
                property,
                value: None,
                lower: Some(lower),
                upper: Some(upper),
            },
            Comparison::IsNull { property } => ComparisonRepr {
                kind,
                property,
                value: None,
                lower: None,
                upper: None,
            },
        }
    }
}

impl TryFrom<ComparisonRepr> for Comparison {
    type Error = ParseError;

    fn try_from(repr: ComparisonRepr) -> Result<Self, Self::Error> {
        let ComparisonRepr {
            kind,
            property,
            value,
            lower,
            upper,
        } = repr;
        let shape_error = |expected| ParseError::InvalidOperand {
            expected,
            found: format!("{} comparison with other operands", kind.name()),
        };

        match (kind.operator(), value, lower, upper) {
            (Some(op), Some(value), None, None) => Ok(Comparison::Binary {
                op,
                property,
                value,
            }),
            (Some(_), _, _, _) => Err(shape_error("a value and no boundaries")),
            (None, None, Some(lower), Some(upper)) if kind == ComparisonType::Between => {
                Ok(Comparison::Between {
                    property,
                    lower,
                    upper,
                })
            }
            (None, _, _, _) if kind == ComparisonType::Between => {
                Err(shape_error("both boundaries and no value"))
            }
            (None, None, None, None) => Ok(Comparison::IsNull { property }),
            (None, _, _, _) => Err(shape_error("no value and no boundaries")),
        }
    }
}

impl Comparison {
    pub fn binary(
        op: ComparisonOperator,
        property: impl Into<FilterNode>,
        value: impl Into<FilterNode>,
    ) -> Self {
        Comparison::Binary {
            op,
            property: Box::new(property.into()),
            value: Box::new(value.into()),
        }
    }

    pub fn between(
        property: impl Into<FilterNode>,
        lower: impl Into<Literal>,
        upper: impl Into<Literal>,
    ) -> Self {
        Comparison::Between {
            property: Box::new(property.into()),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn is_null(property: impl Into<FilterNode>) -> Self {
        Comparison::IsNull {
            property: Box::new(property.into()),
        }
    }

    /// The property side of the comparison.
    pub fn property(&self) -> &FilterNode {
        match self {
            Comparison::Binary { property, .. }
            | Comparison::Between { property, .. }
            | Comparison::IsNull { property } => property,
        }
    }

    /// The full comparison type, including `BETWEEN` and `IS_NULL`.
    pub fn comparison_type(&self) -> ComparisonType {
        match self {
            Comparison::Binary { op, .. } => ComparisonType::from(*op),
            Comparison::Between { .. } => ComparisonType::Between,
            Comparison::IsNull { .. } => ComparisonType::IsNull,
        }
    }
}

/// Operators of a comparison between a property and a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    EqualTo,
    NotEqualTo,
    LessThan,
    GreaterThan,
    LessThanOrEqualTo,
    GreaterThanOrEqualTo,
    Like,
    #[serde(rename = "ILIKE")]
    ILike,
}

impl ComparisonOperator {
    /// The CQL symbol for the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::EqualTo => "=",
            ComparisonOperator::NotEqualTo => "<>",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThanOrEqualTo => "<=",
            ComparisonOperator::GreaterThanOrEqualTo => ">=",
            ComparisonOperator::Like => "LIKE",
            ComparisonOperator::ILike => "ILIKE",
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "=" => ComparisonOperator::EqualTo,
            "<>" => ComparisonOperator::NotEqualTo,
            "<" => ComparisonOperator::LessThan,
            ">" => ComparisonOperator::GreaterThan,
            "<=" => ComparisonOperator::LessThanOrEqualTo,
            ">=" => ComparisonOperator::GreaterThanOrEqualTo,
            "LIKE" => ComparisonOperator::Like,
            "ILIKE" => ComparisonOperator::ILike,
            _ => {
                return Err(ParseError::InvalidOperand {
                    expected: "comparison operator",
                    found: s.to_string(),
                });
            }
        })
    }
}

/// Every comparison type a [`Comparison`] can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonType {
    EqualTo,
    NotEqualTo,
    LessThan,
    GreaterThan,
    LessThanOrEqualTo,
    GreaterThanOrEqualTo,
    Between,
    Like,
    #[serde(rename = "ILIKE")]
    ILike,
    IsNull,
}

impl ComparisonType {
    pub fn name(self) -> &'static str {
        match self {
            ComparisonType::EqualTo => "EQUAL_TO",
            ComparisonType::NotEqualTo => "NOT_EQUAL_TO",
            ComparisonType::LessThan => "LESS_THAN",
            ComparisonType::GreaterThan => "GREATER_THAN",
            ComparisonType::LessThanOrEqualTo => "LESS_THAN_OR_EQUAL_TO",
            ComparisonType::GreaterThanOrEqualTo => "GREATER_THAN_OR_EQUAL_TO",
            ComparisonType::Between => "BETWEEN",
            ComparisonType::Like => "LIKE",
            ComparisonType::ILike => "ILIKE",
            ComparisonType::IsNull => "IS_NULL",
        }
    }

    /// The binary operator for this type. `BETWEEN` and `IS_NULL` have none.
    pub fn operator(self) -> Option<ComparisonOperator> {
        Some(match self {
            ComparisonType::EqualTo => ComparisonOperator::EqualTo,
            ComparisonType::NotEqualTo => ComparisonOperator::NotEqualTo,
            ComparisonType::LessThan => ComparisonOperator::LessThan,
            ComparisonType::GreaterThan => ComparisonOperator::GreaterThan,
            ComparisonType::LessThanOrEqualTo => ComparisonOperator::LessThanOrEqualTo,
            ComparisonType::GreaterThanOrEqualTo => ComparisonOperator::GreaterThanOrEqualTo,
            ComparisonType::Like => ComparisonOperator::Like,
            ComparisonType::ILike => ComparisonOperator::ILike,
            ComparisonType::Between | ComparisonType::IsNull => return None,
        })
    }
}

impl From<ComparisonOperator> for ComparisonType {
    fn from(op: ComparisonOperator) -> Self {
        match op {
            ComparisonOperator::EqualTo => ComparisonType::EqualTo,
            ComparisonOperator::NotEqualTo => ComparisonType::NotEqualTo,
            ComparisonOperator::LessThan => ComparisonType::LessThan,
            ComparisonOperator::GreaterThan => ComparisonType::GreaterThan,
            ComparisonOperator::LessThanOrEqualTo => ComparisonType::LessThanOrEqualTo,
            ComparisonOperator::GreaterThanOrEqualTo => ComparisonType::GreaterThanOrEqualTo,
            ComparisonOperator::Like => ComparisonType::Like,
            ComparisonOperator::ILike => ComparisonType::ILike,
        }
    }
}

/// A logical combination of filters.
///
/// `NOT` always holds one filter and `AND`/`OR` always hold two. Chains such as `a AND b AND c`
/// nest rather than flatten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logical {
    #[serde(rename = "type")]
    pub op: LogicalOperator,
    pub filters: Vec<FilterNode>,
}

impl Logical {
    pub fn and(lhs: impl Into<FilterNode>, rhs: impl Into<FilterNode>) -> Self {
        Self::binary(LogicalOperator::And, lhs, rhs)
    }

    pub fn or(lhs: impl Into<FilterNode>, rhs: impl Into<FilterNode>) -> Self {
        Self::binary(LogicalOperator::Or, lhs, rhs)
    }

    pub fn not(operand: impl Into<FilterNode>) -> Self {
        Logical {
            op: LogicalOperator::Not,
            filters: vec![operand.into()],
        }
    }

    /// Combine two filters with a binary operator. Passing [`LogicalOperator::Not`] wraps only
    /// `lhs`; use [`Logical::not`] instead.
    pub fn binary(
        op: LogicalOperator,
        lhs: impl Into<FilterNode>,
        rhs: impl Into<FilterNode>,
    ) -> Self {
        match op {
            LogicalOperator::Not => Self::not(lhs),
            LogicalOperator::And | LogicalOperator::Or => Logical {
                op,
                filters: vec![lhs.into(), rhs.into()],
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl LogicalOperator {
    pub fn name(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
            LogicalOperator::Not => "NOT",
        }
    }
}

impl FromStr for LogicalOperator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(LogicalOperator::And),
            "OR" => Ok(LogicalOperator::Or),
            "NOT" => Ok(LogicalOperator::Not),
            _ => Err(ParseError::InvalidOperand {
                expected: "logical operator",
                found: s.to_string(),
            }),
        }
    }
}

/// A spatial predicate over a geometry property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spatial {
    #[serde(rename = "type")]
    pub op: SpatialOperator,
    pub property: String,
    pub value: SpatialValue,
    /// Only set for `DWITHIN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Spatial {
    pub fn bbox(property: impl Into<String>, bounds: Bounds) -> Self {
        Spatial {
            op: SpatialOperator::Bbox,
            property: property.into(),
            value: SpatialValue::Bounds(bounds),
            distance: None,
        }
    }

    /// Build an `INTERSECTS`, `WITHIN` or `CONTAINS` predicate.
    pub fn relate(op: SpatialOperator, property: impl Into<String>, geometry: Geometry) -> Self {
        Spatial {
            op,
            property: property.into(),
            value: SpatialValue::Geometry(geometry),
            distance: None,
        }
    }

    pub fn dwithin(property: impl Into<String>, geometry: Geometry, distance: f64) -> Self {
        Spatial {
            op: SpatialOperator::DWithin,
            property: property.into(),
            value: SpatialValue::Geometry(geometry),
            distance: Some(distance),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpatialOperator {
    Bbox,
    Intersects,
    Within,
    Contains,
    #[serde(rename = "DWITHIN")]
    DWithin,
}

impl SpatialOperator {
    pub fn name(self) -> &'static str {
        match self {
            SpatialOperator::Bbox => "BBOX",
            SpatialOperator::Intersects => "INTERSECTS",
            SpatialOperator::Within => "WITHIN",
            SpatialOperator::Contains => "CONTAINS",
            SpatialOperator::DWithin => "DWITHIN",
        }
    }
}

impl FromStr for SpatialOperator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BBOX" => Ok(SpatialOperator::Bbox),
            "INTERSECTS" => Ok(SpatialOperator::Intersects),
            "WITHIN" => Ok(SpatialOperator::Within),
            "CONTAINS" => Ok(SpatialOperator::Contains),
            "DWITHIN" => Ok(SpatialOperator::DWithin),
            _ => Err(ParseError::InvalidOperand {
                expected: "spatial operator",
                found: s.to_string(),
            }),
        }
    }
}

/// The right hand side of a spatial predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialValue {
    Bounds(Bounds),
    Geometry(Geometry),
}

/// An axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Bounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

/// A geometry literal kept as its well-known-text source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub kind: GeometryType,
    pub wkt: String,
}

impl Geometry {
    /// Wrap a WKT string, reading the geometry type from its leading keyword.
    pub fn from_wkt(wkt: impl Into<String>) -> Result<Self, ParseError> {
        let wkt = wkt.into();
        let keyword = wkt.split('(').next().unwrap_or_default().trim();
        let kind = keyword.parse()?;
        Ok(Geometry { kind, wkt })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryType {
    pub const ALL: [GeometryType; 7] = [
        GeometryType::Point,
        GeometryType::LineString,
        GeometryType::Polygon,
        GeometryType::MultiPoint,
        GeometryType::MultiLineString,
        GeometryType::MultiPolygon,
        GeometryType::GeometryCollection,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
            GeometryType::Polygon => "POLYGON",
            GeometryType::MultiPoint => "MULTIPOINT",
            GeometryType::MultiLineString => "MULTILINESTRING",
            GeometryType::MultiPolygon => "MULTIPOLYGON",
            GeometryType::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }
}

impl FromStr for GeometryType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeometryType::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::InvalidOperand {
                expected: "geometry type",
                found: s.to_string(),
            })
    }
}
