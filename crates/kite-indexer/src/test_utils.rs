//! Test fixtures: temporary repositories

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

/// Create a repository with a specific file structure
pub fn create_repo_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}

/// A small Python package with internal, external and cyclic imports.
///
/// ```text
/// main.py        -> app.service, os
/// app/__init__.py
/// app/service.py -> app.models, json
/// app/models.py  -> app.service  (cycle)
/// ```
pub fn create_python_repo() -> TempDir {
    create_repo_with_structure(&[
        (
            "main.py",
            "import os\nfrom app import service\n\n\ndef main():\n    service.run()\n",
        ),
        ("app/__init__.py", ""),
        (
            "app/service.py",
            "import json\nfrom app.models import Model\n\n\ndef run():\n    return json.dumps(Model().data)\n",
        ),
        (
            "app/models.py",
            "from app import service\n\n\nclass Model:\n    def __init__(self):\n        self.data = {}\n",
        ),
    ])
}

/// Move the modification time of `path` forward without touching its content.
pub fn bump_mtime(path: &Path) {
    let file = fs::OpenOptions::new().write(true).open(path).unwrap();
    let current = file.metadata().unwrap().modified().unwrap();
    let later = current.max(SystemTime::now()) + Duration::from_secs(5);
    file.set_modified(later).unwrap();
}
