use console::Style;
use lumitrace_core::pipeline::{AnalysisConfig, ReferenceKind};

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    method: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_analysis_summary(config: &AnalysisConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Lumitrace Analysis"));
    println!(
        "  {}",
        s.title.apply_to(
            "\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}"
        )
    );
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Raw"),
        s.path.apply_to(config.raw.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Reference"),
        s.path.apply_to(config.reference.display())
    );
    match config.reference_kind {
        ReferenceKind::DarkMedian { frames } => {
            println!(
                "  {:<14}{}",
                s.label.apply_to("Correction"),
                s.method.apply_to(format!("dark median over {frames} frames"))
            );
        }
        ReferenceKind::Background => {
            println!(
                "  {:<14}{}",
                s.label.apply_to("Correction"),
                s.method.apply_to("background image")
            );
        }
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Clusters"),
        s.value.apply_to(config.clustering.n_clusters)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Covariance"),
        s.method.apply_to(format!("{:?}", config.clustering.covariance))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Min area"),
        s.value.apply_to(config.blob.min_area)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Seed"),
        s.value.apply_to(config.clustering.seed)
    );
    println!();
}
