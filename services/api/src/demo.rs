use clap::Args;

use demand_intel::error::AppError;
use demand_intel::intelligence::{
    BuyerType, DecisionSettings, ScoreFactors, ScoringEngine,
};

#[derive(Args, Debug)]
pub(crate) struct SignalScoreArgs {
    /// Estimated deal value in the marketplace currency
    #[arg(long)]
    estimated_value: f64,
    /// Product category of the opportunity
    #[arg(long)]
    category: String,
    /// Optional subcategory
    #[arg(long)]
    subcategory: Option<String>,
    /// Optional buyer industry
    #[arg(long)]
    industry: Option<String>,
    /// Delivery country code
    #[arg(long)]
    country: String,
    /// Requested delivery window in days
    #[arg(long)]
    timeline_days: u32,
    /// Buyer qualification: verified, registered, or guest
    #[arg(long, default_value = "registered", value_parser = parse_buyer_type)]
    buyer_type: BuyerType,
    /// Known count of matching suppliers
    #[arg(long, default_value_t = 0)]
    suppliers: u32,
    /// Average historical supplier match score (0-10)
    #[arg(long)]
    avg_match: Option<f32>,
}

fn parse_buyer_type(raw: &str) -> Result<BuyerType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "verified" | "verified_business" => Ok(BuyerType::VerifiedBusiness),
        "registered" | "registered_business" => Ok(BuyerType::RegisteredBusiness),
        "guest" => Ok(BuyerType::Guest),
        other => Err(format!(
            "unknown buyer type '{other}' (expected verified, registered, or guest)"
        )),
    }
}

/// Score one opportunity with the default decision settings and print the
/// breakdown. Useful for demos and for sanity-checking threshold changes.
pub(crate) fn run_signal_score(args: SignalScoreArgs) -> Result<(), AppError> {
    let SignalScoreArgs {
        estimated_value,
        category,
        subcategory,
        industry,
        country,
        timeline_days,
        buyer_type,
        suppliers,
        avg_match,
    } = args;

    let factors = ScoreFactors {
        estimated_value,
        category: category.clone(),
        subcategory,
        industry,
        country: country.clone(),
        delivery_timeline_days: timeline_days,
        buyer_type,
        matching_suppliers_count: suppliers,
        avg_supplier_match_score: avg_match,
    };

    let settings = DecisionSettings::default();
    let breakdown = ScoringEngine::new(settings.clone()).evaluate(&factors);

    println!("Demand signal scoring");
    println!("Opportunity: {category} -> {country}, value {estimated_value:.0}");

    println!("\nScore breakdown");
    for component in &breakdown.components {
        println!(
            "- {:?}: {:.1} ({})",
            component.dimension, component.score, component.notes
        );
    }

    println!("\nOverall score: {:.1}", breakdown.scores.overall);
    println!("Classification: {}", breakdown.classification.label());
    println!("Routed action: {}", breakdown.action.label());
    println!(
        "Thresholds: auto-RFQ >= {:.1}, admin review >= {:.1}, buy >= {:.1}, research >= {:.1}",
        settings.auto_rfq_min_score,
        settings.admin_review_min_score,
        settings.buy_classification_min_score,
        settings.research_classification_min_score
    );

    Ok(())
}
