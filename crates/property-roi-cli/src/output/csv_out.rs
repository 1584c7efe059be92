use serde_json::Value;
use std::io;

use super::{cell, flatten};

/// Write output as CSV to stdout.
///
/// A result envelope becomes two-column `field,value` rows with nested
/// objects flattened to dotted names. A bare array becomes one row per
/// record.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match value {
        Value::Object(map) => {
            let target = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            write_fields(&mut wtr, &flatten(target))
        }
        Value::Array(arr) => write_records(&mut wtr, arr),
        _ => wtr.write_record([cell(value)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        tracing::error!(error = %e, "failed to write CSV output");
    }
}

fn write_fields<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[(String, Value)]) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in rows {
        wtr.write_record([key.as_str(), &cell(val)])?;
    }
    Ok(())
}

fn write_records<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            wtr.write_record([cell(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    wtr.write_record(&headers)?;
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(cell).unwrap_or_default())
                .collect();
            wtr.write_record(&row)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(f: impl FnOnce(&mut csv::Writer<Vec<u8>>) -> csv::Result<()>) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        f(&mut wtr).unwrap();
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_fields_are_flattened() {
        let v = json!({ "npv": "12.5", "scores": { "risk": "33" } });
        let out = render(|w| write_fields(w, &flatten(v.as_object().unwrap())));
        assert_eq!(out, "field,value\nnpv,12.5\nscores.risk,33\n");
    }

    #[test]
    fn test_records_use_first_object_headers() {
        let v = json!([{ "year": 1, "interest": "10" }, { "year": 2, "interest": "9" }]);
        let out = render(|w| write_records(w, v.as_array().unwrap()));
        assert_eq!(out, "interest,year\n10,1\n9,2\n");
    }
}
