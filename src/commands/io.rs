//! Inspect and convert command handlers.

use std::path::Path;

use mechstore::config::StoreConfig;
use mechstore::io::formats::text;
use mechstore::io::{Format, MechanismStore, SaveOptions};
use mechstore::{Result, Value};

/// Executes the inspect command.
pub fn cmd_inspect(path: &Path, json: bool) -> Result<()> {
    let value = mechstore::load(path)?;

    if json {
        let rendered = text::to_pretty_json(&value)?;
        println!("{}", String::from_utf8_lossy(&rendered));
        return Ok(());
    }

    match &value {
        Value::Sequence(items) => {
            println!("{}: {} mechanisms", path.display(), items.len());
            for (idx, item) in items.iter().enumerate() {
                println!("[{idx}]");
                match item {
                    Value::Mapping(fields) => {
                        for (key, field) in fields.iter() {
                            println!("  {key}: {}", describe(field));
                        }
                    },
                    other => println!("  {}", describe(other)),
                }
            }
        },
        other => println!("{}: {}", path.display(), describe(other)),
    }

    Ok(())
}

/// Executes the convert command.
pub fn cmd_convert(
    config: &StoreConfig,
    input: &Path,
    output: &Path,
    format: Option<&str>,
    overwrite: bool,
) -> Result<()> {
    let format = format.map(str::parse::<Format>).transpose()?;
    let mechanisms = mechstore::load_mechanisms(input)?;

    let mut options = SaveOptions::default().with_overwrite(overwrite || config.overwrite);
    if let Some(format) = format {
        options = options.with_format(format);
    }

    let store = MechanismStore::from_config(config);
    let result = store.save(&mechanisms, output, &options)?;

    println!(
        "Saved {} mechanisms to ({}): {}",
        result.saved,
        result.format,
        result.path.display()
    );
    Ok(())
}

/// One-line type summary of a value.
fn describe(value: &Value) -> String {
    match value {
        Value::Array(array) => format!("{} array {:?}", array.dtype(), array.shape()),
        Value::Sequence(items) => format!("sequence of {}", items.len()),
        Value::Mapping(fields) => format!("mapping with {} keys", fields.len()),
        Value::String(s) => format!("string {s:?}"),
        Value::Number(n) => format!("{} {n}", value.kind_name()),
        Value::Bool(b) => format!("bool {b}"),
        Value::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechstore::NdArray;

    #[test]
    fn test_describe() {
        let a = NdArray::from_i64(vec![2, 2], vec![0, 1, 1, 2]).unwrap();
        assert_eq!(describe(&Value::Array(a)), "int64 array [2, 2]");
        assert_eq!(describe(&Value::from(1.5)), "float 1.5");
        assert_eq!(describe(&Value::Sequence(vec![Value::Null])), "sequence of 1");
        assert_eq!(describe(&Value::from("a")), "string \"a\"");
    }
}
