/*
[INPUT]:  API base URL and task id (command-line arguments)
[OUTPUT]: Task details, customers and users
[POS]:    Examples - read-only gateway queries
[UPDATE]: When adding new lookup endpoints
*/

use taskdesk_adapter::*;

/// Example: fetch a task plus the lookup collections used by the task form
///
/// Usage: cargo run --example task_lookup_example -- http://localhost:5000 <task-id>
#[tokio::main]
async fn main() {
    println!("=== Taskdesk Task Lookup Example ===\n");

    let mut args = std::env::args().skip(1);
    let base_url = args.next().unwrap_or_else(|| "http://localhost:5000".to_string());
    let task_id = TaskId::new(args.next().unwrap_or_else(|| "1".to_string()));

    let client = match TaskdeskClient::with_config_and_base_url(ClientConfig::default(), &base_url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    println!("✓ HTTP client created for {}\n", client.base_url());

    println!("Fetching task {}...", task_id);
    match client.get_task(&task_id).await {
        Ok(Some(task)) => println!(
            "✓ {} [{}] with {} photos and {} comments",
            task.title,
            task.status,
            task.photos.len(),
            task.comments.len()
        ),
        Ok(None) => println!("✗ Task not found"),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nFetching customers...");
    match client.get_customers().await {
        Ok(customers) => println!("✓ {} customers", customers.len()),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nFetching users...");
    match client.get_users().await {
        Ok(users) => println!("✓ {} users", users.len()),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\n✓ Task lookup example complete");
}
