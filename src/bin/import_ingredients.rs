//! Utility to bulk-import ingredients from a tab-separated reference file
//!
//! Expected columns: name, kcal_per_100g, proteins_per_100g,
//! carbs_per_100g, fats_per_100g. Lines starting with '#' are skipped,
//! as is a header line whose numeric columns do not parse.

use std::path::PathBuf;

use macrolog::models::IngredientCreate;

fn get_database_path() -> PathBuf {
    std::env::var("MACROLOG_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            std::fs::create_dir_all(&path).ok();
            path.push("macrolog.db");
            path
        })
}

fn parse_line(line: &str) -> Option<IngredientCreate> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 5 {
        return None;
    }

    let name = fields[0].trim();
    if name.is_empty() {
        return None;
    }

    Some(IngredientCreate {
        name: name.to_string(),
        kcal_per_100g: fields[1].trim().parse().ok()?,
        proteins_per_100g: fields[2].trim().parse().ok()?,
        carbs_per_100g: fields[3].trim().parse().ok()?,
        fats_per_100g: fields[4].trim().parse().ok()?,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let file = match std::env::args().nth(1) {
        Some(f) => f,
        None => {
            eprintln!("Usage: import_ingredients <ingredients.tsv>");
            std::process::exit(1);
        }
    };

    let db_path = get_database_path();
    println!("Database path: {}", db_path.display());

    let database = macrolog::db::Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        macrolog::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let content = std::fs::read_to_string(&file)?;

    let mut imported = 0usize;
    let mut skipped = 0usize;

    database.with_conn(|conn| {
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Some(data) => {
                    macrolog::models::Ingredient::create(conn, &data)?;
                    imported += 1;
                }
                None => {
                    eprintln!("Skipping line {}: {}", lineno + 1, line);
                    skipped += 1;
                }
            }
        }
        Ok(())
    })?;

    println!("Imported {} ingredient(s), skipped {}", imported, skipped);

    Ok(())
}
