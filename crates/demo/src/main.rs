use anyhow::Context;

use shopfloor_inventory::Store;
use shopfloor_products::Product;
use shopfloor_sales::CreateOrder;

fn main() -> anyhow::Result<()> {
    shopfloor_observability::init();

    let mut store = Store::new();
    tracing::info!(store_id = %store.id_typed(), "store opened");

    let laptop = Product::new("Ноутбук", 1000, 5)?;
    let phone = Product::new("Смартфон", 500, 10)?;
    let laptop_key = laptop.key().clone();
    let phone_key = phone.key().clone();

    store.add_product(laptop)?;
    store.add_product(phone)?;

    print!("{}", store.list_products());

    let mut order = store.create_order();
    order
        .add_product(&store, &laptop_key, 2)
        .context("adding laptops to the order")?;
    order
        .add_product(&store, &phone_key, 3)
        .context("adding phones to the order")?;

    let order_id = order.id();
    order
        .confirm(&mut store)
        .with_context(|| format!("confirming order {order_id}"))?;

    let total = order.calculate_total();
    println!("Общая стоимость заказа: {total}");

    print!("{}", store.list_products());
    Ok(())
}
