#![allow(clippy::panic_in_result_fn)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::as_conversions)]

use std::sync::Arc;

use proptest::collection::vec;
use proptest::prelude::*;
use xmlobject::qname::QName;
use xmlobject::types::any::AnyElement;
use xmlobject::types::saml::Assertion;
use xmlobject::{ElementType, Handle, NamedElement, NodeRef};

const NAMES: [&str; 3] = ["a", "b", "c"];
const TYPES: [Option<&str>; 3] = [None, Some("T"), Some("U")];
const IDS: [Option<&str>; 4] = [None, Some("i0"), Some("i1"), Some("i2")];
const POOL: usize = 8;

#[derive(Clone, Debug)]
enum Op {
    Push(usize),
    Insert(usize, usize),
    Set(usize, usize),
    Remove(usize),
    RemoveElement(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..POOL).prop_map(Op::Push),
        (0..10usize, 0..POOL).prop_map(|(i, e)| Op::Insert(i, e)),
        (0..10usize, 0..POOL).prop_map(|(i, e)| Op::Set(i, e)),
        (0..10usize).prop_map(Op::Remove),
        (0..POOL).prop_map(Op::RemoveElement),
    ]
}

fn element(seed: usize) -> NodeRef {
    let name = NAMES[seed % NAMES.len()];
    let schema_type = TYPES[(seed / NAMES.len()) % TYPES.len()];
    AnyElement::build_with(QName::local(name), schema_type.map(QName::local)).into_node()
}

fn keys() -> Vec<QName> {
    NAMES
        .iter()
        .chain(TYPES.iter().flatten())
        .map(|name| QName::local(name))
        .collect()
}

fn assert_index_matches_filter(assertion: &Handle<Assertion>) -> Result<(), TestCaseError> {
    let body = assertion.read().unwrap();
    let statements = body.statements();
    for key in keys() {
        let naive: Vec<&NodeRef> = statements
            .iter()
            .filter(|node| node.matches(&key))
            .collect();
        let indexed = statements.get_by_tag(&key);
        prop_assert_eq!(naive.len(), indexed.len());
        for (expected, actual) in naive.iter().zip(indexed.iter()) {
            prop_assert!(Arc::ptr_eq(expected, actual));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_indexed_list_matches_naive_filter(ops in vec(op_strategy(), 0..40)) {
        let assertion = Assertion::build();
        let pool: Vec<NodeRef> = (0..POOL).map(element).collect();

        for op in ops {
            let mut body = assertion.write().unwrap();
            let statements = body.statements_mut();
            let len = statements.len();
            match op {
                Op::Push(e) => {
                    let _ = statements.push(Arc::clone(&pool[e]));
                }
                Op::Insert(i, e) => {
                    let _ = statements.insert(i % (len + 1), Arc::clone(&pool[e]));
                }
                Op::Set(i, e) if len > 0 => {
                    let _ = statements.set(i % len, Arc::clone(&pool[e]));
                }
                Op::Remove(i) if len > 0 => {
                    statements.remove(i % len);
                }
                Op::RemoveElement(e) => {
                    statements.remove_element(&pool[e]);
                }
                _ => {}
            }
            drop(body);
            assert_index_matches_filter(&assertion)?;
        }
    }

    #[test]
    fn test_single_ownership_and_unique_ids(
        ops in vec((0..2usize, op_strategy()), 0..40),
        ids in vec(0..IDS.len(), POOL),
    ) {
        let parents = [
            AnyElement::build_with(QName::local("p0"), None),
            AnyElement::build_with(QName::local("p1"), None),
        ];
        let pool: Vec<NodeRef> = (0..POOL).map(element).collect();
        for (node, id) in pool.iter().zip(ids.iter()) {
            if let Some(id) = IDS[*id] {
                // pool members are detached, so repeated IDs are accepted here
                node.set_id_attribute(QName::xml_id(), Some(id)).unwrap();
            }
        }

        for (p, op) in ops {
            let before: Vec<Vec<NodeRef>> = parents.iter().map(|p| p.ordered_children()).collect();
            let mut body = parents[p].write().unwrap();
            let children = body.children_mut();
            let len = children.len();
            let result = match op {
                Op::Push(e) => children.push(Arc::clone(&pool[e])).map(|_| ()),
                Op::Insert(i, e) => children.insert(i % (len + 1), Arc::clone(&pool[e])).map(|_| ()),
                Op::Set(i, e) if len > 0 => children.set(i % len, Arc::clone(&pool[e])).map(|_| ()),
                Op::Remove(i) if len > 0 => {
                    children.remove(i % len);
                    Ok(())
                }
                Op::RemoveElement(e) => {
                    children.remove_element(&pool[e]);
                    Ok(())
                }
                _ => Ok(()),
            };
            drop(body);

            if result.is_err() {
                let after: Vec<Vec<NodeRef>> = parents.iter().map(|p| p.ordered_children()).collect();
                prop_assert_eq!(before.len(), after.len());
                for (b, a) in before.iter().zip(after.iter()) {
                    prop_assert_eq!(b.len(), a.len());
                    prop_assert!(b.iter().zip(a.iter()).all(|(x, y)| Arc::ptr_eq(x, y)));
                }
            }

            for node in &pool {
                let holders: Vec<usize> = parents
                    .iter()
                    .enumerate()
                    .filter(|(_, parent)| {
                        parent.ordered_children().iter().any(|child| Arc::ptr_eq(child, node))
                    })
                    .map(|(i, _)| i)
                    .collect();
                prop_assert!(holders.len() <= 1);
                match (holders.first(), node.parent()) {
                    (Some(&i), Some(parent)) => prop_assert!(Arc::ptr_eq(&parent, parents[i].node())),
                    (None, None) => {}
                    (holder, parent) => prop_assert!(
                        false,
                        "holder {:?} disagrees with parent {:?}",
                        holder,
                        parent.map(|p| p.element_qname().clone())
                    ),
                }
            }

            for parent in &parents {
                let mut seen = Vec::new();
                for child in parent.ordered_children() {
                    if let Some(id) = child.attribute(&QName::xml_id()) {
                        prop_assert!(!seen.contains(&id), "duplicate ID {} under one parent", id);
                        let owner = parent.resolve_id(&id);
                        prop_assert!(owner.is_some_and(|owner| Arc::ptr_eq(&owner, &child)));
                        seen.push(id);
                    }
                }
                prop_assert_eq!(parent.id_index().len(), seen.len());
            }
        }
    }
}
