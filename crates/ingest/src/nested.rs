use roster_core::{FieldValue, FlatRecord, Node, StructuredRecord, Tree};

/// Expand dotted keys (`address.city`) into nested objects.
pub fn build_nested(record: &FlatRecord) -> StructuredRecord {
    let mut result = StructuredRecord::new();
    for (key, value) in record {
        set_nested(&mut result.root, key, value.clone());
    }
    result
}

/// Assign `value` at `path`, creating intermediate objects as needed.
///
/// Leaf/branch conflicts resolve as last-write-wins: an intermediate leaf is
/// replaced by an object, and a final assignment replaces whatever node exists.
fn set_nested(root: &mut Tree, path: &str, value: FieldValue) {
    let parts: Vec<&str> = path.split('.').collect();
    set_at(root, &parts, value);
}

fn set_at(tree: &mut Tree, parts: &[&str], value: FieldValue) {
    match parts {
        [] => {}
        [last] => {
            tree.insert(last.to_string(), Node::Value(value));
        }
        [head, rest @ ..] => {
            let slot = tree
                .entry(head.to_string())
                .or_insert_with(|| Node::Object(Tree::new()));
            if let Node::Object(child) = slot {
                set_at(child, rest, value);
            } else {
                let mut child = Tree::new();
                set_at(&mut child, rest, value);
                *slot = Node::Object(child);
            }
        }
    }
}
