use std::fs::File;
use std::path::Path;
use log::{info, error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ResidentRecord {
    #[serde(rename = "Name(s)", alias = "Names", alias = "Name", alias = "name")]
    pub names: String,
    #[serde(rename = "Address", alias = "address", alias = "Street Address")]
    pub address: String,
    #[serde(rename = "Town", alias = "town", alias = "City", alias = "city")]
    pub town: String,
    #[serde(rename = "Phone Number", alias = "Phone", alias = "phone", default)]
    pub phone: String,
}

pub fn load_records<P: AsRef<Path>>(filename: P) -> Vec<ResidentRecord> {
    let mut records = Vec::new();
    let path_ref = filename.as_ref();

    if !path_ref.exists() {
        error!("Input file {:?} does not exist.", path_ref);
        return records;
    }

    let file = match File::open(path_ref) {
        Ok(f) => f,
        Err(e) => {
            error!("Could not open CSV file: {}", e);
            return records;
        }
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    for result in rdr.deserialize() {
        match result {
            Ok(record) => {
                records.push(record);
            }
            Err(e) => {
                error!("Error parsing CSV record: {}", e);
            }
        }
    }
    info!("Loaded {} records from CSV {:?}", records.len(), path_ref);
    records
}
