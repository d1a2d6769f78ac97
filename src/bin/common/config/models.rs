use std::path::{Path, PathBuf};

use log::info;
use radproc::constants::DEFAULT_COMPLEVEL;
use radproc::modules::heavyrain::models::Season;
use radproc::store::FrameStore;
use radproc::RadprocError;

use super::builder::ConfigContainer;

/// Config file values merged with the command line
#[derive(Debug, Default)]
pub struct RadprocConfig {
    container: ConfigContainer,
}

fn required<T>(cli: Option<T>, config: Option<T>, name: &str) -> Result<T, RadprocError> {
    cli.or(config)
        .ok_or_else(|| format!("missing {name}: pass it as argument or set it in the config file").into())
}

impl RadprocConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self, RadprocError> {
        let container = match config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(format!("Config file {} is not a file", path.display()).into());
                }
                info!("Loading config from {}", path.display());
                ConfigContainer::from_file(&path.to_string_lossy())
                    .map_err(|err| format!("Failed to load config: {}", err))?
            }
            None => ConfigContainer::default(),
        };
        Ok(Self { container })
    }

    pub fn store_path(&self, cli: Option<PathBuf>) -> Result<PathBuf, RadprocError> {
        required(cli, self.container.store.as_ref().map(PathBuf::from), "store")
    }

    pub fn complevel(&self) -> u8 {
        self.container.complevel.unwrap_or(DEFAULT_COMPLEVEL)
    }

    pub fn threads(&self, cli: Option<usize>) -> Option<usize> {
        cli.or(self.container.threads)
    }

    pub fn gauge_folder(&self, cli: Option<PathBuf>) -> Result<PathBuf, RadprocError> {
        required(
            cli,
            self.container.gauge_folder.as_ref().map(PathBuf::from),
            "gauge folder",
        )
    }

    pub fn threshold(&self, cli: Option<f32>) -> Result<f32, RadprocError> {
        required(cli, self.container.threshold, "threshold")
    }

    pub fn min_area(&self, cli: Option<usize>) -> Result<usize, RadprocError> {
        required(cli, self.container.min_area, "min area")
    }

    pub fn season(&self, cli: Option<String>) -> Result<Season, RadprocError> {
        required(cli, self.container.season.clone(), "season")?.parse()
    }

    pub fn max_nan_days(&self, cli: Option<f32>) -> Result<f32, RadprocError> {
        required(cli, self.container.max_nan_days, "max nan days")
    }

    /// Output file, standard output when missing
    pub fn output(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.container.output.as_ref().map(PathBuf::from))
    }

    /// Store for `path`. The file is created on the first write.
    #[cfg(feature = "hdf5")]
    pub fn open_store(&self, path: &Path) -> Result<Box<dyn FrameStore>, RadprocError> {
        use radproc::store::Hdf5Store;
        Ok(Box::new(
            Hdf5Store::new(path).with_complevel(self.complevel()),
        ))
    }

    #[cfg(not(feature = "hdf5"))]
    pub fn open_store(&self, path: &Path) -> Result<Box<dyn FrameStore>, RadprocError> {
        Err(format!(
            "cannot open {}: radproc was built without the hdf5 feature",
            path.display()
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_config() {
        let config = RadprocConfig {
            container: ConfigContainer {
                threshold: Some(5.0),
                season: Some("Year".into()),
                ..Default::default()
            },
        };
        assert_eq!(config.threshold(None).unwrap(), 5.0);
        assert_eq!(config.threshold(Some(7.0)).unwrap(), 7.0);
        assert_eq!(config.season(None).unwrap(), Season::Year);
        assert!(config.min_area(None).is_err());
        assert_eq!(config.complevel(), DEFAULT_COMPLEVEL);
        assert!(config.output(None).is_none());
    }
}
