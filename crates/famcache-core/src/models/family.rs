use serde::{Deserialize, Serialize};

use super::de;

/// One person in the family tree, with descendants nested below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub relationship_type: Option<String>,
    #[serde(rename = "isCurrentUser", default)]
    pub is_current_user: bool,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

/// The member's family tree, rooted at the eldest known ancestor.
pub type FamilyTree = TreeNode;

impl TreeNode {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.full_name.as_deref())
            .unwrap_or("-")
    }

    pub fn relation(&self) -> Option<&str> {
        self.relation.as_deref().or(self.relationship_type.as_deref())
    }

    /// Number of people in this subtree, including this node.
    pub fn member_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::member_count).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    pub fn find_current_user(&self) -> Option<&TreeNode> {
        if self.is_current_user {
            return Some(self);
        }
        self.children.iter().find_map(TreeNode::find_current_user)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub member_count: u64,
}

impl Branch {
    pub fn display_name(&self) -> &str {
        self.name_ar
            .as_deref()
            .or(self.branch_name.as_deref())
            .or(self.name.as_deref())
            .unwrap_or("-")
    }
}
