use cropwise_core::crops::{self, builtin};
use cropwise_core::error::CropwiseError;
use std::path::Path;

pub fn list() -> Result<(), CropwiseError> {
    for name in builtin::PRESETS {
        let table = builtin::load_preset(name)?;
        println!("{} (v{}) [{}]\n", table.name, table.version, name);
        if let Some(ref desc) = table.description {
            println!("{}\n", desc);
        }

        let width = table.crop_names().map(str::len).max().unwrap_or(10);
        for crop in &table.crops {
            let seasons: Vec<String> = crop
                .requirements
                .seasons
                .iter()
                .map(|s| s.to_string())
                .collect();
            println!(
                "  {:<width$}  {:<10}  {}",
                crop.name,
                crop.family.to_string(),
                seasons.join(", "),
                width = width
            );
        }
        println!();
    }
    Ok(())
}

pub fn explain(crop: &str) -> Result<(), CropwiseError> {
    let table = builtin::load_default()?;
    let profile = table
        .crops
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(crop))
        .ok_or_else(|| CropwiseError::UnknownCrop(crop.to_string()))?;
    let req = &profile.requirements;
    let econ = &profile.economics;
    let fp = &profile.footprint;

    println!("{} ({})\n", profile.name, profile.family);

    println!("Growing requirements:");
    println!("  pH             {:.1} - {:.1}", req.ph_min, req.ph_max);
    println!("  Nitrogen       >= {} kg/ha", req.n_min);
    println!("  Phosphorus     >= {} kg/ha", req.p_min);
    println!("  Potassium      >= {} kg/ha", req.k_min);
    println!("  Moisture       >= {}%", req.moisture_min);
    println!(
        "  Temperature    {} - {} C",
        req.temperature_min, req.temperature_max
    );
    println!("  Rainfall       >= {} mm", req.rainfall_min);
    let seasons: Vec<String> = req.seasons.iter().map(|s| s.to_string()).collect();
    println!("  Seasons        {}", seasons.join(", "));
    println!();

    println!("Economics (per hectare):");
    println!("  Market price   {} /kg", econ.market_price);
    println!("  Input cost     {}", econ.input_cost);
    println!("  Labor cost     {}", econ.labor_cost);
    println!("  Risk factor    {:.0}%", econ.risk_factor * 100.0);
    println!("  Average yield  {} kg", profile.average_yield);
    println!("  Average profit {}", profile.average_profit);
    println!();

    println!("Environmental footprint:");
    println!("  Water usage    {} L/ha", fp.water_usage);
    println!("  Soil health    {:+}", fp.soil_health_impact);
    println!("  Carbon         {} kg CO2e/ha", fp.carbon_footprint);
    println!("  Biodiversity   {:+}", fp.biodiversity_impact);
    println!("  Sustainability {}/100", profile.sustainability_score);

    let good = table.compatible_predecessors(&profile.name);
    if !good.is_empty() {
        println!("\nGrows well after: {}", good.join(", "));
    }
    let bad = table.incompatible_predecessors(&profile.name);
    if !bad.is_empty() {
        println!("Avoid after:      {}", bad.join(", "));
    }

    Ok(())
}

pub fn validate(path: &Path) -> Result<(), CropwiseError> {
    let table = crops::load_table(path)?;
    println!(
        "Valid crop table: {} (v{}) with {} crops",
        table.name,
        table.version,
        table.crops.len()
    );
    Ok(())
}
