//! Markdown text for adapter results, shared by slash commands and tools.

use vault_chat_core::{code_list, field};

use crate::docker::{ContainerSummary, CreatedContainer, ImageSummary};

pub fn vault_files(files: &[String]) -> String {
    if files.is_empty() {
        return "No files found in the Obsidian vault.".to_string();
    }
    code_list("Obsidian Files", files)
}

pub fn directory_files(directory: &str, files: &[String]) -> String {
    if files.is_empty() {
        return format!("No files found in directory `{}`.", directory);
    }
    code_list(&format!("Files in `{}`", directory), files)
}

pub fn search_results(query: &str, results: &[String]) -> String {
    if results.is_empty() {
        return format!("No results found for query `{}`.", query);
    }
    code_list(&format!("Search Results for `{}`", query), results)
}

pub fn images(images: &[ImageSummary]) -> String {
    if images.is_empty() {
        return "No Docker images found.".to_string();
    }
    let mut output = String::from("### Docker Images\n");
    for image in images {
        output.push_str(&format!("- {}\n", field("ID", &image.short_id())));
        output.push_str(&format!("  - {}\n", field("Tags", &image.tags.join(", "))));
    }
    output
}

pub fn containers(containers: &[ContainerSummary]) -> String {
    if containers.is_empty() {
        return "No running containers found.".to_string();
    }
    let mut output = String::from("### Running Docker Containers\n");
    for container in containers {
        let image = if container.image.is_empty() {
            "N/A"
        } else {
            container.image.as_str()
        };
        output.push_str(&format!("- {}\n", field("Name", &container.name)));
        output.push_str(&format!("  - {}\n", field("ID", &container.short_id())));
        output.push_str(&format!("  - {}\n", field("Image", image)));
        output.push_str(&format!("  - {}\n", field("Status", &container.state)));
    }
    output
}

pub fn created_container(created: &CreatedContainer) -> String {
    let mut output = String::new();
    if created.pulled {
        output.push_str(&format!(
            "Image `{}` not found locally. Pulled it from the registry.\n\n",
            created.image
        ));
    }
    output.push_str(&format!(
        "Container `{}` successfully created and started from `{}`. ID: `{}`",
        created.name,
        created.image,
        created.short_id()
    ));
    output
}
