//! Serializes a filter tree back into CQL text.
//!
//! The output is shaped so that parsing it again yields an equal tree: both operands of `AND` and
//! `OR` are parenthesized and `NOT` always wraps its operand in parentheses.

use std::fmt::{self, Display, Formatter};

use crate::ast::{
    Bounds, Comparison, FilterNode, Geometry, Literal, Logical, LogicalOperator, Spatial,
    SpatialValue,
};

/// Render a filter as CQL text. Equivalent to `filter.to_string()`.
pub fn to_cql(filter: &FilterNode) -> String {
    filter.to_string()
}

impl Display for FilterNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Comparison(comparison) => comparison.fmt(f),
            FilterNode::Logical(logical) => logical.fmt(f),
            FilterNode::Spatial(spatial) => spatial.fmt(f),
            FilterNode::Literal(literal) => literal.fmt(f),
            FilterNode::Property(name) => f.write_str(name),
            FilterNode::Geometry(geometry) => geometry.fmt(f),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::Binary {
                op,
                property,
                value,
            } => write!(f, "{property} {} {value}", op.symbol()),
            Comparison::Between {
                property,
                lower,
                upper,
            } => write!(f, "{property} BETWEEN {lower} AND {upper}"),
            Comparison::IsNull { property } => write!(f, "{property} IS NULL"),
        }
    }
}

impl Display for Logical {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.op == LogicalOperator::Not {
            f.write_str("NOT (")?;
            if let Some(operand) = self.filters.first() {
                operand.fmt(f)?;
            }
            return f.write_str(")");
        }

        for (idx, filter) in self.filters.iter().enumerate() {
            if idx > 0 {
                write!(f, " {} ", self.op.name())?;
            }
            write!(f, "({filter})")?;
        }
        Ok(())
    }
}

impl Display for Spatial {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {}", self.op.name(), self.property, self.value)?;
        if let Some(distance) = self.distance {
            write!(f, ", {distance}")?;
        }
        f.write_str(")")
    }
}

impl Display for SpatialValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SpatialValue::Bounds(bounds) => bounds.fmt(f),
            SpatialValue::Geometry(geometry) => geometry.fmt(f),
        }
    }
}

impl Display for Bounds {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl Display for Geometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wkt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ComparisonOperator, GeometryType, SpatialOperator};

    fn prop(name: &str) -> FilterNode {
        FilterNode::Property(name.into())
    }

    #[test]
    fn strings_are_quoted_and_escaped() {
        assert_eq!(Literal::from("A'B").to_string(), "'A''B'");
        assert_eq!(Literal::Number(10.0).to_string(), "10");
        assert_eq!(Literal::Number(-0.25).to_string(), "-0.25");
    }

    #[test]
    fn logical_operands_are_parenthesized() {
        let filter: FilterNode = Logical::or(
            Logical::and(
                Comparison::binary(ComparisonOperator::EqualTo, prop("A"), Literal::Number(1.0)),
                Comparison::is_null(prop("B")),
            ),
            Logical::not(Comparison::between(prop("C"), 1.0, 2.5)),
        )
        .into();
        assert_eq!(
            to_cql(&filter),
            "((A = 1) AND (B IS NULL)) OR (NOT (C BETWEEN 1 AND 2.5))"
        );
    }

    #[test]
    fn spatial_calls() {
        let bbox: FilterNode = Spatial::bbox("GEOM", Bounds::new(0.0, 0.5, 10.0, 20.0)).into();
        assert_eq!(bbox.to_string(), "BBOX(GEOM, 0, 0.5, 10, 20)");

        let point = Geometry {
            kind: GeometryType::Point,
            wkt: "POINT(1 2)".into(),
        };
        let dwithin: FilterNode = Spatial::dwithin("GEOM", point.clone(), 100.0).into();
        assert_eq!(dwithin.to_string(), "DWITHIN(GEOM, POINT(1 2), 100)");

        let within: FilterNode = Spatial::relate(SpatialOperator::Within, "GEOM", point).into();
        assert_eq!(within.to_string(), "WITHIN(GEOM, POINT(1 2))");
    }
}
