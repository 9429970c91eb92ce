use tracing::info;
use vision_scenarios::{Detection, Line, PartCounter, Scenario, Threshold, TrackerParams};

fn main() -> Result<(), vision_scenarios::ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter("vision_scenarios=debug")
        .init();

    let counter = PartCounter::new(Threshold::from_percent(50)?, TrackerParams::new(5, 1, 0.3));
    counter.set_line(Some(Line::new(100.0, 0.0, 100.0, 500.0)));

    for center_x in [55.0, 80.0, 105.0, 130.0] {
        let detections = vec![
            Detection::new("part", center_x - 30.0, 100.0, center_x + 30.0, 160.0, 0.9),
            Detection::new("part", 300.0, 300.0, 340.0, 340.0, 0.2),
        ];
        let report = counter.update(&detections);
        info!(
            objects = report.objects.len(),
            counted = ?report.counted(),
            "frame processed"
        );
    }

    for metric in counter.get_metrics() {
        info!(name = %metric.name, count = metric.count, "metric");
    }

    Ok(())
}
