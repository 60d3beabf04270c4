// src/bin/nearby_probe.rs
// Usage: nearby-probe <lat> <lng> [radius_km] [min_rating]
use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::{Duration, Instant};

// --- ANSI colours ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

#[derive(Deserialize, Debug)]
struct NearbyResponse {
    #[serde(default)]
    restaurants: Vec<Restaurant>,
    #[serde(default)]
    total: usize,
    #[serde(default)]
    notices: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct Restaurant {
    name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    cuisine: Vec<String>,
    #[serde(default)]
    distance_km: f64,
    source: String,
    #[serde(default)]
    has_menu: bool,
}

#[derive(Debug, Clone, Copy)]
struct ProbeArgs {
    lat: f64,
    lng: f64,
    radius_km: Option<f64>,
    min_rating: Option<f64>,
}

fn parse_args(args: &[String]) -> Result<ProbeArgs> {
    if args.len() < 2 {
        bail!("usage: nearby-probe <lat> <lng> [radius_km] [min_rating]");
    }

    let number = |i: usize, name: &str| -> Result<Option<f64>> {
        args.get(i)
            .map(|raw| {
                raw.parse::<f64>()
                    .with_context(|| format!("{} must be a number, got '{}'", name, raw))
            })
            .transpose()
    };

    Ok(ProbeArgs {
        lat: number(0, "lat")?.unwrap_or_default(),
        lng: number(1, "lng")?.unwrap_or_default(),
        radius_km: number(2, "radius_km")?,
        min_rating: number(3, "min_rating")?,
    })
}

struct NearbyProbe {
    base_url: String,
    client: Client,
}

impl NearbyProbe {
    fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { base_url, client })
    }

    async fn check_service_health(&self) -> bool {
        match self.client.get(format!("{}/health", self.base_url)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn fetch_nearby(&self, args: ProbeArgs) -> Result<NearbyResponse> {
        let mut query = vec![("lat", args.lat.to_string()), ("lng", args.lng.to_string())];
        if let Some(radius) = args.radius_km {
            query.push(("radius_km", radius.to_string()));
        }
        if let Some(min_rating) = args.min_rating {
            query.push(("min_rating", min_rating.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/nearby", self.base_url))
            .query(&query)
            .send()
            .await
            .context("Request to /nearby failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            bail!("HTTP {} - {}", status, body);
        }

        response
            .json::<NearbyResponse>()
            .await
            .context("Failed to parse /nearby response")
    }

    async fn run(&self, args: ProbeArgs) -> Result<()> {
        println!("\n{}🔍 Checking service status...{}", CYAN, RESET);
        if !self.check_service_health().await {
            println!("{}❌ Service unavailable at {}{}", RED, self.base_url, RESET);
            bail!("service is not running");
        }
        println!("{}✅ Service available{}\n", GREEN, RESET);

        println!(
            "{}🍽️  Restaurants near ({}, {}){}",
            BOLD, args.lat, args.lng, RESET
        );

        let started = Instant::now();
        let response = self.fetch_nearby(args).await?;
        let elapsed = started.elapsed().as_secs_f64();

        self.print_table(&response);

        for notice in &response.notices {
            println!("{}⚠️  {}{}", YELLOW, notice, RESET);
        }

        println!(
            "\n{}📊 {} restaurants in {:.2}s{}",
            BOLD, response.total, elapsed, RESET
        );
        Ok(())
    }

    fn print_table(&self, response: &NearbyResponse) {
        println!("──────────────────────────────────────────────────────────────────────────────────────────");
        println!(
            "{:<30} {:<8} {:>6} {:>8} {:<5} {:<28}",
            "Name", "Source", "Rating", "Km", "Menu", "Cuisine"
        );
        println!("──────────────────────────────────────────────────────────────────────────────────────────");

        for r in &response.restaurants {
            println!(
                "{:<30} {:<8} {:>6.1} {:>8.2} {:<5} {:<28}",
                truncate(&r.name, 30),
                r.source,
                r.rating,
                r.distance_km,
                if r.has_menu { "yes" } else { "" },
                truncate(&r.cuisine.join(", "), 28)
            );
            if !r.address.is_empty() {
                println!("  {}{}{}", CYAN, truncate(&r.address, 80), RESET);
            }
        }

        println!("──────────────────────────────────────────────────────────────────────────────────────────");
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let probe_args = parse_args(&args)?;

    let base_url = env::var("FOODIE_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8003".to_string());

    let probe = NearbyProbe::new(base_url)?;
    probe.run(probe_args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args(&strings(&["12.97", "77.59", "5"])).unwrap();
        assert_eq!(args.lat, 12.97);
        assert_eq!(args.radius_km, Some(5.0));
        assert_eq!(args.min_rating, None);

        assert!(parse_args(&strings(&["12.97"])).is_err());
        assert!(parse_args(&strings(&["north", "77.59"])).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Dosa", 10), "Dosa");
        assert_eq!(truncate("Vidyarthi Bhavan", 6), "Vidya…");
    }
}
