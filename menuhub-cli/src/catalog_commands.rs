use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use menuhub_client::{Method, MenuClient, PageQuery, RequestBody, RequestOptions, ResponseExt};
use menuhub_types::{ApiResponse, MenuData};

use crate::cli::Paging;

pub async fn list_businesses(
    client: &MenuClient,
    paging: &Paging,
    sort: Option<String>,
    json: bool,
) -> Result<()> {
    let mut query = PageQuery::new(paging.page, paging.page_size);
    query.sort = sort;
    let response = client.list_businesses(&query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let page = response.into_result()?;
    if page.items.is_empty() {
        println!("{}", "No businesses found.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Name", "Slug", "VAT %", "Created"]);
    for business in &page.items {
        table.add_row(vec![
            Cell::new(&business.id),
            Cell::new(&business.name),
            Cell::new(&business.slug).fg(Color::Cyan),
            Cell::new(business.vat_percentage),
            Cell::new(
                business
                    .created_on_utc()
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }

    println!("{table}");
    println!("\nPage {} of {}, {} businesses total", page.page, page.total_pages, page.total_count);
    Ok(())
}

pub async fn list_categories(
    client: &MenuClient,
    slug: &str,
    paging: &Paging,
    json: bool,
) -> Result<()> {
    let response = client
        .list_categories(slug, &PageQuery::new(paging.page, paging.page_size))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let page = response.into_result()?;
    if page.items.is_empty() {
        println!("{}", format!("No categories for {slug}.").yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Order", "Title", "ID"]);
    for category in &page.items {
        table.add_row(vec![
            Cell::new(category.display_order.map_or_else(|| "-".to_string(), |o| o.to_string())),
            Cell::new(&category.title),
            Cell::new(&category.id),
        ]);
    }

    println!("{table}");
    println!("\n{} categories total", page.total_count);
    Ok(())
}

pub async fn show_menu(client: &MenuClient, slug: &str, public: bool, json: bool) -> Result<()> {
    let response: ApiResponse<MenuData> =
        if public { client.public_menu(slug).await? } else { client.panel_menu(slug).await? };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let menu = response.into_result()?;
    let title = menu.business.name.clone().unwrap_or_else(|| slug.to_string());
    println!("{}", title.cyan().bold());
    if let Some(address) = &menu.business.postal_address {
        println!("  {address}");
    }

    if menu.categories.is_empty() {
        println!("{}", "The menu is empty.".yellow());
        return Ok(());
    }

    for category in &menu.categories {
        println!("\n{}", category.title.bold());
        if category.products.is_empty() {
            println!("  {}", "(no products)".dimmed());
            continue;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Product", "Price", "Final", "kcal", "Prep (min)"]);
        for product in &category.products {
            table.add_row(vec![
                Cell::new(&product.name),
                Cell::new(product.price),
                Cell::new(product.final_price).fg(Color::Green),
                Cell::new(product.calories.map_or_else(|| "-".to_string(), |c| c.to_string())),
                Cell::new(
                    product
                        .average_preparation_minutes
                        .map_or_else(|| "-".to_string(), |m| m.to_string()),
                ),
            ]);
        }
        println!("{table}");
    }

    println!("\n{} products in {} categories", menu.product_count(), menu.categories.len());
    Ok(())
}

pub async fn upload(
    client: &MenuClient,
    file: &Path,
    content_type: Option<String>,
    json: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("File name is not valid UTF-8")?;
    let content_type = content_type.unwrap_or_else(|| guess_content_type(file).to_string());

    let response = client.upload_image(file_name, &content_type, bytes).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    for uploaded in response.into_result()? {
        println!("{} Uploaded {} as {}", "✓".green(), uploaded.file_path, uploaded.id.green());
    }
    Ok(())
}

pub async fn raw_request(
    client: &MenuClient,
    method: &str,
    path: &str,
    body: Option<String>,
    slug: Option<String>,
    query: Vec<(String, String)>,
) -> Result<()> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method '{method}'"))?;
    let body = body
        .map(|raw| serde_json::from_str(&raw).context("Request body is not valid JSON"))
        .transpose()?
        .map(RequestBody::Json);

    let mut options = RequestOptions::new();
    if let Some(slug) = slug {
        options = options.slug(slug);
    }
    for (key, value) in query {
        options = options.query(key, value);
    }

    let response = client.request_raw(method, path, body, options).await?;

    match serde_json::from_slice::<serde_json::Value>(&response.body) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) if response.body.is_empty() => {
            println!("{} {}", "✓".green(), response.status);
        },
        Err(_) => println!("{}", String::from_utf8_lossy(&response.body)),
    }
    Ok(())
}

fn guess_content_type(path: &Path) -> &'static str {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
