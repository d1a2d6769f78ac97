use serde_derive::{Deserialize, Serialize};
use serde_yaml;
use std::fs::File;
use std::io::BufRead;
use std::io::Read;
use std::{collections::HashMap, io};

use radproc::RadprocError;

pub type ConfigMap = HashMap<String, Vec<String>>;

const STORE_KEY: &str = "STORE";
const COMPLEVEL_KEY: &str = "COMPLEVEL";
const THREADS_KEY: &str = "THREADS";
const GAUGE_FOLDER_KEY: &str = "GAUGEFOLDER";
const THRESHOLD_KEY: &str = "THRESHOLD";
const MIN_AREA_KEY: &str = "MINAREA";
const SEASON_KEY: &str = "SEASON";
const MAX_NAN_DAYS_KEY: &str = "MAXNANDAYS";
const OUTPUT_KEY: &str = "OUTPUT";

trait ConfigMapExt {
    /// Get the first value of a key in the config map
    fn first(&self, key: &str) -> Option<String>;
    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, RadprocError>;
}

impl ConfigMapExt for ConfigMap {
    fn first(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|values| values.first().cloned())
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, RadprocError> {
        match self.first(key) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| format!("invalid value '{value}' for {key}").into()),
            None => Ok(None),
        }
    }
}

pub fn read_config(file_name: impl Into<String>) -> Result<ConfigMap, RadprocError> {
    let file_name = file_name.into();
    let file =
        File::open(&file_name).map_err(|error| format!("error opening config file: {error}"))?;
    let reader = io::BufReader::new(file);

    let mut config_map: ConfigMap = ConfigMap::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|error| format!("error line: {i} \n {error}"))?;
        let line = line.trim();

        if line.starts_with('%') || line.starts_with('#') || line.is_empty() {
            // skip comments and empty lines
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or(format!("error parsing config file {file_name} at line {i}."))?;

        config_map
            .entry(key.trim().to_uppercase())
            .or_default()
            .push(value.trim().into());
    }
    Ok(config_map)
}

/// Settings shared by all commands. Command line arguments take precedence.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigContainer {
    /// HDF5 file holding the monthly datasets
    pub store: Option<String>,
    pub complevel: Option<u8>,
    pub threads: Option<usize>,
    /// folder with the MR90 station files
    pub gauge_folder: Option<String>,
    pub threshold: Option<f32>, // mm
    pub min_area: Option<usize>, // cells
    pub season: Option<String>,
    pub max_nan_days: Option<f32>, // days
    pub output: Option<String>,
}

impl ConfigContainer {
    pub fn from_file(config_file: &str) -> Result<ConfigContainer, RadprocError> {
        // Check the file extension to determine which method to use
        if config_file.ends_with(".yaml") || config_file.ends_with(".yml") {
            Self::from_yaml(config_file)
        } else if config_file.ends_with(".txt") || config_file.ends_with(".cfg") {
            Self::from_txt_file(config_file)
        } else {
            Err(RadprocError::from(format!(
                "Unsupported config file format: {}",
                config_file
            )))
        }
    }

    pub fn from_yaml(config_file: &str) -> Result<Self, RadprocError> {
        let mut file = File::open(config_file)
            .map_err(|err| format!("Cannot open config file {}: {}", config_file, err))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|err| format!("Cannot read config file {}: {}", config_file, err))?;

        let conf = serde_yaml::from_str(&contents)
            .map_err(|err| format!("Cannot parse config file {}: {}", config_file, err))?;
        Ok(conf)
    }

    fn from_txt_file(config_file: &str) -> Result<ConfigContainer, RadprocError> {
        let config_map = read_config(config_file)?;

        Ok(ConfigContainer {
            store: config_map.first(STORE_KEY),
            complevel: config_map.parsed(COMPLEVEL_KEY)?,
            threads: config_map.parsed(THREADS_KEY)?,
            gauge_folder: config_map.first(GAUGE_FOLDER_KEY),
            threshold: config_map.parsed(THRESHOLD_KEY)?,
            min_area: config_map.parsed(MIN_AREA_KEY)?,
            season: config_map.first(SEASON_KEY),
            max_nan_days: config_map.parsed(MAX_NAN_DAYS_KEY)?,
            output: config_map.first(OUTPUT_KEY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn txt_and_yaml_configs_match() {
        let dir = tempfile::tempdir().unwrap();

        let txt = dir.path().join("radproc.txt");
        fs::write(
            &txt,
            "% radproc settings\nSTORE=/data/RW.h5\nCOMPLEVEL=4\nSEASON=May - October\nthreshold = 7.5\nMINAREA=10\n",
        )
        .unwrap();
        let from_txt = ConfigContainer::from_file(txt.to_str().unwrap()).unwrap();

        let yaml = dir.path().join("radproc.yaml");
        fs::write(
            &yaml,
            "store: /data/RW.h5\ncomplevel: 4\nseason: May - October\nthreshold: 7.5\nmin_area: 10\n",
        )
        .unwrap();
        let from_yaml = ConfigContainer::from_file(yaml.to_str().unwrap()).unwrap();

        assert_eq!(from_txt, from_yaml);
        assert_eq!(from_txt.store.as_deref(), Some("/data/RW.h5"));
        assert_eq!(from_txt.threads, None);
    }

    #[test]
    fn invalid_configs() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("bad.txt");
        fs::write(&txt, "COMPLEVEL=high\n").unwrap();
        assert!(ConfigContainer::from_file(txt.to_str().unwrap()).is_err());

        fs::write(&txt, "no separator\n").unwrap();
        assert!(ConfigContainer::from_file(txt.to_str().unwrap()).is_err());

        assert!(ConfigContainer::from_file("radproc.ini").is_err());
    }
}
