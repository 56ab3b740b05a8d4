use std::error::Error;
use std::path::Path;
use log::info;

use crate::input_loader::ResidentRecord;

pub const OUTPUT_HEADER: [&str; 4] = ["Name(s)", "Address", "Town", "Phone Number"];

/// Writes the full record set once, one row per input record in input
/// order, header always present.
pub fn write_records<P: AsRef<Path>>(
    path: P,
    records: &[ResidentRecord],
) -> Result<(), Box<dyn Error>> {
    let path_ref = path.as_ref();
    let mut writer = csv::Writer::from_path(path_ref)?;

    writer.write_record(OUTPUT_HEADER)?;
    for record in records {
        writer.write_record([&record.names, &record.address, &record.town, &record.phone])?;
    }
    writer.flush()?;

    info!("Wrote {} records to {:?}", records.len(), path_ref);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_loader::load_records;

    fn record(names: &str, phone: &str) -> ResidentRecord {
        ResidentRecord {
            names: names.to_string(),
            address: "12 Oak St".to_string(),
            town: "Hartford".to_string(),
            phone: phone.to_string(),
        }
    }

    #[test]
    fn writes_fixed_header_and_every_row_in_order() {
        let path = std::env::temp_dir().join(format!("{}_residents_out.csv", std::process::id()));
        let records = vec![
            record("John Smith", "(860) 555-0144"),
            record("Jane Doe", ""),
            record("Ann Lee", "(203) 555-0101"),
        ];
        write_records(&path, &records).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let first_line = raw.lines().next().unwrap();
        assert_eq!(first_line, "Name(s),Address,Town,Phone Number");

        let reloaded = load_records(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(reloaded.len(), records.len());
        assert_eq!(reloaded[0].names, "John Smith");
        assert_eq!(reloaded[1].phone, "");
        assert_eq!(reloaded[2].phone, "(203) 555-0101");
    }
}
