//! Generic element holding whatever it was given

use std::sync::Weak;

use crate::dom::Element;
use crate::error::{Error, Result};
use crate::list::ChildList;
use crate::marshaller::{ContentModel, Marshaller};
use crate::node::{ElementType, Node, NodeRef, XmlObject};
use crate::registry::Provider;
use crate::unmarshaller::Unmarshaller;

/// Element of any name: extension attributes, text or arbitrary children
///
/// Holds either text or child elements. Mixed content is rejected when unmarshalling.
#[derive(Debug)]
pub struct AnyElement {
    text_content: Option<String>,
    children: ChildList,
}

impl AnyElement {
    pub fn text_content(&self) -> Option<&str> {
        self.text_content.as_deref()
    }

    pub fn set_text_content(&mut self, text: Option<String>) {
        self.text_content = text;
    }

    pub fn children(&self) -> &ChildList {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut ChildList {
        &mut self.children
    }
}

impl XmlObject for AnyElement {
    fn ordered_children(&self) -> Vec<NodeRef> {
        self.children.as_slice().to_vec()
    }
}

impl ElementType for AnyElement {
    fn create(owner: &Weak<Node>) -> Self {
        Self {
            text_content: None,
            children: ChildList::new(owner),
        }
    }
}

#[derive(Debug, Default)]
pub struct AnyElementMarshaller;

impl Marshaller for AnyElementMarshaller {
    fn content_model(&self, node: &Node) -> ContentModel {
        match node.body::<AnyElement>() {
            Ok(body) if body.children.is_empty() && body.text_content.is_some() => {
                ContentModel::Text
            }
            _ => ContentModel::Children,
        }
    }

    fn marshall_element_content(&self, node: &Node, element: &mut Element) -> Result<()> {
        if let Some(text) = node.body::<AnyElement>()?.text_content() {
            element.push_text(text);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct AnyElementUnmarshaller;

impl Unmarshaller for AnyElementUnmarshaller {
    fn process_child_element(&self, parent: &NodeRef, child: NodeRef) -> Result<()> {
        let mut body = parent.body_mut::<AnyElement>()?;
        if body.text_content.is_some() {
            return Err(mixed_content(parent));
        }
        body.children.push(child)?;
        Ok(())
    }

    fn process_element_content(&self, node: &NodeRef, content: &str) -> Result<()> {
        let mut body = node.body_mut::<AnyElement>()?;
        if !body.children.is_empty() {
            return Err(mixed_content(node));
        }
        body.text_content
            .get_or_insert_with(String::new)
            .push_str(content);
        Ok(())
    }
}

fn mixed_content(node: &Node) -> Error {
    Error::unmarshalling(format!(
        "mixed content in {} is not supported",
        node.element_qname()
    ))
}

pub fn provider() -> Provider {
    Provider::of::<AnyElement>(AnyElementMarshaller, AnyElementUnmarshaller)
}
