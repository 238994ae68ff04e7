use anyhow::Result;
use cart_store::cart::{Cart, CartService, DeleteItem, NewItem, UpdateItem};
use cart_store::catalog::Catalog;
use cart_store::dynamodb::{DynamoDb, Table};
use std::io::{self, Write};
use tracing::info;

/// Runs the interactive cart shell.
///
/// This function enters a loop that prompts the user for commands and executes them.
/// The supported commands are:
/// - info: Print table information
/// - create: Create a cart with its first item
/// - add: Add an item to a cart, or raise its quantity
/// - update: Replace the quantity of an item in a cart
/// - delete: Remove an item from a cart
/// - load: Print a cart
/// - items: List the catalog items of a category
/// - exit: Exit the program
///
/// Cart and catalog errors are printed and the loop continues; only I/O and
/// table errors end it.
///
/// # Arguments
///
/// * `ddb` - A reference to the DynamoDB client
/// * `table` - The store table
/// * `carts` - The cart engine
/// * `catalog` - The catalog reader
pub async fn run(
    ddb: &DynamoDb,
    table: &Table<'_>,
    carts: &CartService<DynamoDb>,
    catalog: &Catalog<DynamoDb>,
) -> Result<()> {
    loop {
        let command = prompt(
            "Enter command (info/create/add/update/delete/load/items/exit)",
            None,
        )?;
        match command.as_str() {
            "info" => print_info(ddb, table).await?,
            "create" => create_cart(carts).await?,
            "add" => add_item(carts).await?,
            "update" => update_item(carts).await?,
            "delete" => delete_item(carts).await?,
            "load" => load_cart(carts).await?,
            "items" => list_items(catalog).await?,
            "exit" => break,
            _ => println!("Unknown command. Please try again."),
        }
    }
    Ok(())
}

/// Prints the table name, key schema, status and item count.
async fn print_info(ddb: &DynamoDb, table: &Table<'_>) -> Result<()> {
    let table_info = ddb.describe_table(table.name()).await?;

    println!("\n--- Table Information ---");
    println!("Table Name: {}", table.name());
    println!("Partition Key: {}", table.partition_key());
    if let Some(sort_key) = table.sort_key() {
        println!("Sort Key: {}", sort_key);
    }
    for index in table.indexes() {
        println!(
            "Index: {} ({} / {})",
            index.name, index.partition_key, index.sort_key
        );
    }
    if let Some(description) = table_info.table() {
        println!("Item Count: {}", description.item_count().unwrap_or(0));
        if let Some(status) = description.table_status() {
            println!("Table Status: {}", status.as_str());
        }
    }
    println!("------------------------\n");
    Ok(())
}

async fn create_cart(carts: &CartService<DynamoDb>) -> Result<()> {
    let item = prompt_new_item(String::new())?;
    match carts.create_and_add_item(item).await {
        Ok(cart) => print_cart(&cart),
        Err(e) => println!("Could not create cart: {e}"),
    }
    Ok(())
}

async fn add_item(carts: &CartService<DynamoDb>) -> Result<()> {
    let cart_id = prompt("Enter cart id", None)?;
    let item = prompt_new_item(cart_id)?;
    match carts.add_item(item).await {
        Ok(cart) => print_cart(&cart),
        Err(e) => println!("Could not add item: {e}"),
    }
    Ok(())
}

async fn update_item(carts: &CartService<DynamoDb>) -> Result<()> {
    let update = UpdateItem {
        cart_id: prompt("Enter cart id", None)?,
        item_id: prompt("Enter item id", Some("11aa"))?,
        quantity: prompt_number("Enter new quantity", Some("5"))?,
    };
    match carts.update_item(update).await {
        Ok(cart) => print_cart(&cart),
        Err(e) => println!("Could not update item: {e}"),
    }
    Ok(())
}

async fn delete_item(carts: &CartService<DynamoDb>) -> Result<()> {
    let delete = DeleteItem {
        cart_id: prompt("Enter cart id", None)?,
        item_id: prompt("Enter item id", Some("11aa"))?,
    };
    match carts.delete_item(delete).await {
        Ok(cart) => print_cart(&cart),
        Err(e) => println!("Could not delete item: {e}"),
    }
    Ok(())
}

async fn load_cart(carts: &CartService<DynamoDb>) -> Result<()> {
    let cart_id = prompt("Enter cart id", None)?;
    match carts.load(&cart_id).await {
        Ok(cart) => print_cart(&cart),
        Err(e) => println!("Could not load cart: {e}"),
    }
    Ok(())
}

async fn list_items(catalog: &Catalog<DynamoDb>) -> Result<()> {
    let category_id = prompt("Enter category id", Some("1"))?;
    match catalog.list(&category_id).await {
        Ok(list) => {
            info!("Listed {} catalog items", list.items.len());
            println!("\n--- Category {category_id} ---");
            for item in &list.items {
                println!("{:<12} {:<32} {:>10.2}", item.item_id, item.description, item.price);
            }
            println!("------------------------\n");
        }
        Err(e) => println!("Could not list items: {e}"),
    }
    Ok(())
}

fn prompt_new_item(cart_id: String) -> Result<NewItem> {
    Ok(NewItem {
        cart_id,
        item_id: prompt("Enter item id", Some("11aa"))?,
        description: prompt("Enter description", Some("Coffee mug"))?,
        price: prompt_number("Enter price", Some("9.99"))?,
        quantity: prompt_number("Enter quantity", Some("1"))?,
    })
}

fn print_cart(cart: &Cart) {
    println!("\n--- Cart {} ---", cart.cart_id());
    for item in cart.items() {
        println!(
            "{:<12} {:<32} {:>10.2} x {}",
            item.item_id, item.description, item.price, item.quantity
        );
    }
    println!("Total: {:.2} ({} items)", cart.total(), cart.count());
    println!("------------------------\n");
}

fn prompt(message: &str, example: Option<&str>) -> Result<String> {
    let full_message = if let Some(ex) = example {
        format!("{} (e.g., {}): ", message, ex)
    } else {
        format!("{}: ", message)
    };
    print!("{}", full_message);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Empty input means the field was left out; anything unparsable is treated
/// the same way so the engine reports it.
fn prompt_number<T: std::str::FromStr>(message: &str, example: Option<&str>) -> Result<Option<T>> {
    let input = prompt(message, example)?;
    Ok(input.parse().ok())
}
