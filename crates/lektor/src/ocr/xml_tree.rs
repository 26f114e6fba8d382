//! Owned, mutable XML element tree.
//!
//! `roxmltree` documents are read-only, so documents that are rewritten in
//! place are copied into this tree, edited, and serialized back through
//! `quick_xml::Writer`. Only elements, attributes and non-whitespace text
//! are retained; comments and processing instructions are dropped.

use crate::{LektorError, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use roxmltree::{Document, Node};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

fn local_part(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

/// One XML element with its qualified name, as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Qualified name, e.g. `alto:String` or `String`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Name for a new element in the same namespace prefix as this one.
    pub fn sibling_name(&self, local: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Element] {
        &mut self.children
    }

    /// First direct child with the given local name.
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.local_name() == local)
    }

    pub fn position(&self, local: &str) -> Option<usize> {
        self.children.iter().position(|c| c.local_name() == local)
    }

    pub fn insert_child(&mut self, index: usize, child: Element) {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Return the direct child named `local`, inserting a new `name`
    /// element at `index` first when there is none.
    pub fn ensure_child(&mut self, local: &str, index: usize) -> &mut Element {
        let index = match self.position(local) {
            Some(existing) => existing,
            None => {
                let index = index.min(self.children.len());
                let name = self.sibling_name(local);
                self.children.insert(index, Element::new(name));
                index
            }
        };
        &mut self.children[index]
    }

    pub fn retain_children<F>(&mut self, f: F)
    where
        F: FnMut(&mut Element) -> bool,
    {
        self.children.retain_mut(f);
    }

    /// First element with the given local name in document order, self excluded.
    pub fn find(&self, local: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| {
            if child.local_name() == local {
                Some(child)
            } else {
                child.find(local)
            }
        })
    }

    pub fn find_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|child| {
            if child.local_name() == local {
                Some(child)
            } else {
                child.find_mut(local)
            }
        })
    }

    /// Number of elements named `local` in this subtree, self excluded.
    pub fn count(&self, local: &str) -> usize {
        self.children
            .iter()
            .map(|child| usize::from(child.local_name() == local) + child.count(local))
            .sum()
    }

    fn from_node(node: Node) -> Self {
        let mut attributes = Vec::new();
        let parent = node.parent_element();
        for ns in node.namespaces() {
            if ns.name() == Some("xml") {
                continue;
            }
            let inherited =
                parent.is_some_and(|p| p.namespaces().any(|o| o.name() == ns.name() && o.uri() == ns.uri()));
            if inherited {
                continue;
            }
            let key = match ns.name() {
                Some(prefix) => format!("xmlns:{}", prefix),
                None => "xmlns".to_string(),
            };
            attributes.push((key, ns.uri().to_string()));
        }
        for attr in node.attributes() {
            attributes.push((qualified(node, attr.namespace(), attr.name()), attr.value().to_string()));
        }

        let text: String = node
            .children()
            .filter(|child| child.is_text())
            .filter_map(|child| child.text())
            .collect();
        let text = (!text.trim().is_empty()).then_some(text);

        let children = node
            .children()
            .filter(|child| child.is_element())
            .map(Element::from_node)
            .collect();

        Self {
            name: qualified(node, node.tag_name().namespace(), node.tag_name().name()),
            attributes,
            text,
            children,
        }
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.text.is_none() && self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        writer.write_event(Event::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

fn qualified(node: Node, namespace: Option<&str>, local: &str) -> String {
    let prefix = match namespace {
        Some(XML_NS) => Some("xml"),
        Some(uri) => node.lookup_prefix(uri),
        None => None,
    };
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

/// An owned document: the root element plus serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTree {
    root: Element,
}

impl XmlTree {
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = Document::parse(xml)?;
        Ok(Self::from_document(&doc))
    }

    pub fn from_document(doc: &Document) -> Self {
        Self {
            root: Element::from_node(doc.root_element()),
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Pretty-printed XML with a declaration, two-space indent and CRLF line endings.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.root.write(&mut writer)?;
        let xml = String::from_utf8(writer.into_inner())
            .map_err(|e| LektorError::serialization_with_source("Serialized XML is not UTF-8", e))?;
        let mut crlf = xml.replace("\r\n", "\n").replace('\n', "\r\n");
        crlf.push_str("\r\n");
        Ok(crlf)
    }
}
