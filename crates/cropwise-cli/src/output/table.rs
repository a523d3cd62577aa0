use cropwise_core::engine::Recommendation;

pub fn print(recommendations: &[Recommendation], verbose: bool) {
    if recommendations.is_empty() {
        println!("No recommendations.");
        return;
    }

    let source = if recommendations.iter().any(|r| r.ml_prediction) {
        "model prediction"
    } else {
        "rule-based scoring"
    };
    println!("=== Crop recommendations ({}) ===\n", source);

    let name_width = recommendations
        .iter()
        .map(|r| r.crop_name.len())
        .max()
        .unwrap_or(10)
        .max(4);
    let show_composite = recommendations.iter().any(|r| r.composite_score.is_some());

    print!(
        "  {:>2}  {:<width$}  {:>10}  {:>12}  {:>12}  {:>14}",
        "#",
        "Crop",
        "Confidence",
        "Yield kg/ha",
        "Profit/ha",
        "Sustainability",
        width = name_width
    );
    if show_composite {
        print!("  {:>9}", "Composite");
    }
    println!();

    for (i, rec) in recommendations.iter().enumerate() {
        print!(
            "  {:>2}  {:<width$}  {:>10.1}  {:>12.0}  {:>12.0}  {:>14.1}",
            i + 1,
            rec.crop_name,
            rec.confidence_score,
            rec.expected_yield,
            rec.profit_margin,
            rec.sustainability_score,
            width = name_width
        );
        if let Some(composite) = rec.composite_score {
            print!("  {:>9.1}", composite);
        }
        println!();
    }

    if !verbose {
        return;
    }

    for rec in recommendations {
        println!("\n--- {} ---", rec.crop_name);
        for reason in &rec.reasoning.reasons {
            println!("  {}", reason);
        }
        if !rec.reasoning.match_details.is_empty() {
            let details: Vec<String> = rec
                .reasoning
                .match_details
                .iter()
                .map(|(factor, fit)| format!("{:?}={}", factor, fit).to_lowercase())
                .collect();
            println!("  Match: {}", details.join(", "));
        }
        if let Some(ref profit) = rec.reasoning.profit_details {
            println!(
                "  Profit: revenue {:.0}, costs {:.0}, risk-adjusted {:.0} (ROI {:.1}%)",
                profit.revenue, profit.total_costs, profit.risk_adjusted_profit, profit.roi
            );
        }
        if let Some(ref s) = rec.reasoning.sustainability_details {
            println!(
                "  Sustainability: water {}, soil {}, carbon {}, biodiversity {}",
                s.breakdown.water_score,
                s.breakdown.soil_score,
                s.breakdown.carbon_score,
                s.breakdown.biodiversity_score
            );
        }
        if let Some(ref rotation) = rec.reasoning.rotation_analysis {
            println!("  Rotation: {}", rotation.rotation_score);
            for line in rotation.benefits.iter().chain(&rotation.penalties) {
                println!("    {}", line);
            }
        }
    }
}
