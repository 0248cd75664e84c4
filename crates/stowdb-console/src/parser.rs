//! Parsing of `--where` filter arguments.

use stowdb_core::api::filter::{Modifier, parse_attribute};
use stowdb_core::api::{FilterValue, Filters};
use stowdb_core::encoding::Value;

/// Parse every `attribute=value` argument into one filter list.
pub fn parse_filters(args: &[String]) -> Result<Filters, String> {
    let mut filters = Filters::new();
    for arg in args {
        let (attribute, value) = parse_filter(arg)?;
        filters.push(attribute, value);
    }
    Ok(filters)
}

/// Parse one `attribute=value` argument.
///
/// List modifiers split the value on commas; each value is read as an
/// integer, then a real, then `NULL`, and otherwise kept as text.
pub fn parse_filter(arg: &str) -> Result<(String, FilterValue), String> {
    let (attribute, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected attribute=value, got '{arg}'"))?;
    let attribute = attribute.trim();
    if attribute.is_empty() {
        return Err(format!("missing attribute in '{arg}'"));
    }

    let (_, modifier) = parse_attribute(attribute).map_err(|e| e.to_string())?;
    let value = match modifier {
        Modifier::In | Modifier::NotIn => FilterValue::List(if raw.is_empty() {
            Vec::new()
        } else {
            raw.split(',').map(|v| Value::parse(v.trim())).collect()
        }),
        Modifier::Eq | Modifier::Not => FilterValue::Scalar(Value::parse(raw)),
    };
    Ok((attribute.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalar_filters() {
        assert_eq!(
            parse_filter("category=hats").unwrap(),
            ("category".to_string(), FilterValue::Scalar(Value::from("hats")))
        );
        assert_eq!(
            parse_filter("stats_health__not=0").unwrap().1,
            FilterValue::Scalar(Value::Integer(0))
        );
        assert_eq!(
            parse_filter("page_source=NULL").unwrap().1,
            FilterValue::Scalar(Value::Null)
        );
        // Only the first '=' separates attribute from value.
        assert_eq!(
            parse_filter("page_url=/wiki?a=b").unwrap().1,
            FilterValue::Scalar(Value::from("/wiki?a=b"))
        );
    }

    #[test]
    fn test_parse_list_filters() {
        assert_eq!(
            parse_filter("category__in=hats, robes").unwrap().1,
            FilterValue::List(vec![Value::from("hats"), Value::from("robes")])
        );
        assert_eq!(
            parse_filter("category__not_in=").unwrap().1,
            FilterValue::List(Vec::new())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_filter("category").is_err());
        assert!(parse_filter("=hats").is_err());
        assert!(parse_filter("category__like=hat").is_err());
    }

    #[test]
    fn test_parse_filters_keeps_order() {
        let filters =
            parse_filters(&["category=hats".to_string(), "name__not=Crown".to_string()]).unwrap();
        let attributes: Vec<&str> = filters.iter().map(|(a, _)| a).collect();
        assert_eq!(attributes, vec!["category", "name__not"]);
    }
}
