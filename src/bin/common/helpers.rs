use itertools::Itertools;
use log::{info, warn};
use radproc::modules::gauge::models::ImportReport;
use radproc::store::DatasetKey;

/// Logs the outcome of a gauge import
pub fn log_import_report(report: &ImportReport) {
    info!("Stations: {}", report.stations.len());
    if let (Some(first), Some(last)) = (report.datasets.first(), report.datasets.last()) {
        info!("Datasets: {} ({} to {})", report.datasets.len(), first, last);
    }
    for file in &report.failed {
        warn!("Not imported: {}", file.display());
    }
}

fn head(key: &DatasetKey) -> String {
    key.components().next().unwrap_or_default().to_string()
}

/// One line per top level group, e.g. `2008: 1 2 3`.
/// Monthly keys are listed in calendar order.
pub fn format_keys(keys: &[DatasetKey]) -> Vec<String> {
    keys.iter()
        .sorted_by_key(|key| (head(key), key.as_month(), (*key).clone()))
        .chunk_by(|key| head(key))
        .into_iter()
        .map(|(head, group)| {
            let tails = group
                .filter_map(|key| key.as_str().split_once('/').map(|(_, tail)| tail.to_string()))
                .join(" ");
            if tails.is_empty() {
                head
            } else {
                format!("{head}: {tails}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_grouped_by_year() {
        let keys = vec![
            DatasetKey::month(2008, 10),
            DatasetKey::month(2008, 2),
            DatasetKey::month(2009, 1),
            "gauges".parse().unwrap(),
        ];
        assert_eq!(
            format_keys(&keys),
            vec!["2008: 2 10".to_string(), "2009: 1".to_string(), "gauges".to_string()]
        );
    }

    #[test]
    fn other_keys_stay_in_their_year() {
        let keys = vec![
            DatasetKey::month(2008, 10),
            "2008/extra".parse().unwrap(),
            DatasetKey::month(2008, 2),
        ];
        assert_eq!(format_keys(&keys), vec!["2008: extra 2 10".to_string()]);
    }
}
