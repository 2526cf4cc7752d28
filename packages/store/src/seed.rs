//! Built-in gallery shown before the operator has stored anything.

use crate::models::{Category, Project, RecordId};

fn project(
    id: i64,
    title: &str,
    description: &str,
    technologies: &[&str],
    image: u32,
    category: Category,
) -> Project {
    Project {
        id: RecordId::Number(id),
        title: title.to_string(),
        description: description.to_string(),
        technologies: technologies.iter().map(|t| t.to_string()).collect(),
        image_url: format!("https://picsum.photos/600/400?random={image}"),
        link: "#".to_string(),
        category,
        visible: true,
    }
}

/// The four projects written to a fresh `projects` collection.
pub fn initial_projects() -> Vec<Project> {
    vec![
        project(
            1,
            "Urban Eco-Center Design",
            "A sustainable community center design focused on renewable energy integration and green spaces.",
            &["Revit", "Lumion", "AutoCAD"],
            10,
            Category::Architecture,
        ),
        project(
            2,
            "E-Commerce Analytics Dashboard",
            "A comprehensive dashboard for visualizing sales data and user trends in real-time.",
            &["React", "TypeScript", "D3.js"],
            1,
            Category::Development,
        ),
        project(
            3,
            "Modern Residential Complex",
            "3D visualization and planning for a 20-unit luxury residential complex in Addis Ababa.",
            &["SketchUp", "V-Ray", "Photoshop"],
            11,
            Category::Architecture,
        ),
        project(
            4,
            "AI-Powered Content Generator",
            "An application leveraging generative AI to help marketers create content efficiently.",
            &["Next.js", "Gemini API", "Tailwind CSS"],
            2,
            Category::Development,
        ),
    ]
}
