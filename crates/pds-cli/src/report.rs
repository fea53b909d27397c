use pds_core::{AvailabilityFilter, EanAvailability};

/// Print a read-only summary of what the last syncs stored.
///
/// # Errors
///
/// Returns an error if any database query fails.
pub(crate) async fn run_report(
    pool: &sqlx::PgPool,
    supplier_gln: Option<&str>,
    limit: i64,
) -> anyhow::Result<()> {
    let stock_rows = pds_db::count_gtin_stock(pool, supplier_gln).await?;
    let article_rows = pds_db::count_articles(pool).await?;
    let suppliers = pds_db::list_distinct_supplier_glns(pool).await?;
    let eans = pds_db::list_distinct_eans(pool).await?;

    println!("pds_gtins_stock rows: {stock_rows}");
    println!("pds_articles rows:    {article_rows}");
    println!("distinct suppliers:   {}", suppliers.len());
    println!("distinct EANs:        {}", eans.len());

    if stock_rows == 0 {
        println!();
        println!(
            "no availability rows{}; run `sync` first",
            supplier_gln
                .map(|gln| format!(" for supplier {gln}"))
                .unwrap_or_default()
        );
        return Ok(());
    }

    let sample = pds_db::list_gtin_stock(
        pool,
        &AvailabilityFilter {
            supplier_gln: supplier_gln.map(str::to_owned),
            retailer_gln: None,
            limit: Some(limit.max(1)),
        },
    )
    .await?;

    println!();
    println!("{}", sample_header());
    for row in &sample {
        println!("{}", sample_line(row));
    }

    Ok(())
}

fn sample_header() -> String {
    format!(
        "{:<15}{:<15}{:<8}{:<10}{:<6}{:<8}UPDATED",
        "EAN", "SUPPLIER GLN", "QTY", "PRICE", "TYPE", "LIGHT"
    )
}

fn sample_line(row: &EanAvailability) -> String {
    let price = row
        .price
        .map_or_else(|| "-".to_string(), |p| p.to_string());
    let light = row.stock_traffic_light.as_deref().unwrap_or("-");
    let timestamp = row
        .stock_timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<15}{:<15}{:<8}{:<10}{:<6}{:<8}{}",
        row.ean,
        row.supplier.supplier_gln,
        row.quantity,
        price,
        row.item_type.as_str(),
        light,
        timestamp
    )
}
