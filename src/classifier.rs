use crate::providers::{Folder, FolderType};

/// Names recognised at the account root when the host gives no folder type
const FALLBACK_NAMES: [&str; 4] = ["trash", "junk", "bulk", "spam"];

/// Find the Trash and Junk folders of one account, in pre-order
pub fn find_trash_and_junk(folders: &[Folder]) -> Vec<&Folder> {
    classify(folders, true)
}

/// Walk a folder forest and collect every Trash/Junk folder.
///
/// Host-typed folders match at any depth. Untyped folders only match by name
/// when they sit directly under the account, so that user folders deeper in
/// the tree that happen to be called "Trash" are left alone. Children of a
/// matched folder are still evaluated on their own.
pub fn classify(folders: &[Folder], is_root_level: bool) -> Vec<&Folder> {
    let mut found = Vec::new();

    for folder in folders {
        log::debug!(
            "Folder: {}, type: {}, root: {}",
            folder.path,
            folder.type_label(),
            is_root_level
        );

        let mut matched = matches!(folder.kind, Some(FolderType::Trash | FolderType::Junk));

        if !matched && is_root_level && is_untyped(folder) && folder.is_root_level() {
            matched = is_fallback_name(&folder.name);
            if matched {
                log::warn!("Folder detected by name at account root: {}", folder.path);
            }
        }

        if matched {
            log::debug!("Found: {} ({})", folder.path, folder.type_label());
            found.push(folder);
        }

        if !folder.sub_folders.is_empty() {
            found.extend(classify(&folder.sub_folders, false));
        }
    }

    found
}

fn is_untyped(folder: &Folder) -> bool {
    matches!(folder.kind, None | Some(FolderType::Unknown))
}

fn is_fallback_name(name: &str) -> bool {
    let name = name.to_lowercase();
    FALLBACK_NAMES.contains(&name.as_str())
}
