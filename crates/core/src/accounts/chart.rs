//! Arena-backed chart of accounts.

use std::collections::HashMap;

use ledgerline_shared::types::AccountId;

use super::error::AccountError;
use super::types::{Account, AccountPatch, NewAccount};

/// An organization's chart of accounts held as an arena plus indexes.
///
/// Nodes are stored in insertion order; `index` maps ids to slots and
/// `children` holds the slot numbers of each node's direct children.
#[derive(Debug, Default, Clone)]
pub struct ChartOfAccounts {
    nodes: Vec<Account>,
    index: HashMap<AccountId, usize>,
    codes: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
}

impl ChartOfAccounts {
    /// Builds a chart from stored accounts.
    ///
    /// Parents may appear after their children in the input. The result is
    /// checked for dangling parents and cycles.
    pub fn from_accounts(accounts: impl IntoIterator<Item = Account>) -> Result<Self, AccountError> {
        let mut chart = Self::default();
        for account in accounts {
            if chart.index.contains_key(&account.id) {
                return Err(AccountError::DuplicateId(account.id));
            }
            if chart.codes.contains_key(&account.code) {
                return Err(AccountError::DuplicateCode(account.code));
            }
            chart.push(account);
        }

        for slot in 0..chart.nodes.len() {
            if let Some(parent_id) = chart.nodes[slot].parent_id {
                let parent = *chart
                    .index
                    .get(&parent_id)
                    .ok_or(AccountError::ParentNotFound(parent_id))?;
                chart.children[parent].push(slot);
            }
        }

        for account in &chart.nodes {
            if let Some(parent_id) = account.parent_id {
                if chart.ancestors_include(parent_id, account.id) {
                    return Err(AccountError::CycleDetected {
                        account_id: account.id,
                        parent_id,
                    });
                }
            }
        }

        Ok(chart)
    }

    fn push(&mut self, account: Account) -> usize {
        let slot = self.nodes.len();
        self.index.insert(account.id, slot);
        self.codes.insert(account.code.clone(), slot);
        self.nodes.push(account);
        self.children.push(Vec::new());
        slot
    }

    /// Number of accounts in the chart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the chart has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All accounts in load order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.nodes.iter()
    }

    /// Looks up an account by id.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.index.get(&id).map(|&slot| &self.nodes[slot])
    }

    /// Looks up an account by code.
    #[must_use]
    pub fn by_code(&self, code: &str) -> Option<&Account> {
        self.codes.get(code).map(|&slot| &self.nodes[slot])
    }

    /// Direct children of an account.
    pub fn children(&self, id: AccountId) -> Result<Vec<&Account>, AccountError> {
        let slot = self.slot(id)?;
        Ok(self.children[slot].iter().map(|&c| &self.nodes[c]).collect())
    }

    /// Returns true if the account has at least one child.
    #[must_use]
    pub fn has_children(&self, id: AccountId) -> bool {
        self.index
            .get(&id)
            .is_some_and(|&slot| !self.children[slot].is_empty())
    }

    /// All descendants of an account, depth-first pre-order, excluding itself.
    pub fn descendants(&self, id: AccountId) -> Result<Vec<&Account>, AccountError> {
        let root = self.slot(id)?;
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.children[root].iter().rev().copied().collect();
        while let Some(slot) = stack.pop() {
            out.push(&self.nodes[slot]);
            stack.extend(self.children[slot].iter().rev().copied());
        }
        Ok(out)
    }

    fn slot(&self, id: AccountId) -> Result<usize, AccountError> {
        self.index.get(&id).copied().ok_or(AccountError::NotFound(id))
    }

    /// Walks up from `start` and reports whether `target` is on the path
    /// (including `start` itself).
    fn ancestors_include(&self, start: AccountId, target: AccountId) -> bool {
        let mut current = Some(start);
        let mut steps = 0usize;
        while let Some(id) = current {
            if id == target {
                return true;
            }
            // A sound chain visits every account at most once, plus `start`
            // when it is not in the chart yet.
            steps += 1;
            if steps > self.nodes.len() + 1 {
                return true;
            }
            current = self.get(id).and_then(|a| a.parent_id);
        }
        false
    }

    /// Validates a new account against the chart and returns the account to store.
    ///
    /// # Errors
    ///
    /// - `MissingField` for a blank code or name
    /// - `CycleDetected` if the parent is the account itself or one of its descendants
    /// - `DuplicateId` / `DuplicateCode` on collisions
    /// - `ParentNotFound` if the parent is not in the chart
    pub fn validate_new(&self, input: NewAccount) -> Result<Account, AccountError> {
        let code = input.code.trim().to_string();
        let name = input.name.trim().to_string();
        if code.is_empty() {
            return Err(AccountError::MissingField("code"));
        }
        if name.is_empty() {
            return Err(AccountError::MissingField("name"));
        }

        let id = input.id.unwrap_or_default();
        if let Some(parent_id) = input.parent_id {
            if self.ancestors_include(parent_id, id) {
                return Err(AccountError::CycleDetected {
                    account_id: id,
                    parent_id,
                });
            }
        }
        if self.index.contains_key(&id) {
            return Err(AccountError::DuplicateId(id));
        }
        if self.codes.contains_key(&code) {
            return Err(AccountError::DuplicateCode(code));
        }
        if let Some(parent_id) = input.parent_id {
            self.slot(parent_id)
                .map_err(|_| AccountError::ParentNotFound(parent_id))?;
        }

        Ok(Account {
            id,
            code,
            name,
            account_type: input.account_type,
            normal_balance: input
                .normal_balance
                .unwrap_or_else(|| input.account_type.default_normal_balance()),
            parent_id: input.parent_id,
            is_system: input.is_system,
            is_active: input.is_active,
            vat_category: input.vat_category,
        })
    }

    /// Adds a validated account to the chart.
    pub fn insert(&mut self, account: Account) -> Result<(), AccountError> {
        let parent = match account.parent_id {
            Some(parent_id) => Some(
                self.slot(parent_id)
                    .map_err(|_| AccountError::ParentNotFound(parent_id))?,
            ),
            None => None,
        };
        let slot = self.push(account);
        if let Some(parent) = parent {
            self.children[parent].push(slot);
        }
        Ok(())
    }

    /// Applies a patch to an account, returning the updated account without
    /// modifying the chart.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account is missing
    /// - `NormalBalanceImmutable` when changing the side of a non-system account
    /// - `CycleDetected` / `ParentNotFound` on a bad reparent
    /// - `DuplicateCode` if the new code is taken
    pub fn validate_update(&self, id: AccountId, patch: AccountPatch) -> Result<Account, AccountError> {
        let mut account = self.get(id).cloned().ok_or(AccountError::NotFound(id))?;

        if let Some(normal_balance) = patch.normal_balance {
            if normal_balance != account.normal_balance {
                if !account.is_system {
                    return Err(AccountError::NormalBalanceImmutable(id));
                }
                account.normal_balance = normal_balance;
            }
        }

        if let Some(code) = patch.code {
            let code = code.trim().to_string();
            if code.is_empty() {
                return Err(AccountError::MissingField("code"));
            }
            if let Some(other) = self.by_code(&code) {
                if other.id != id {
                    return Err(AccountError::DuplicateCode(code));
                }
            }
            account.code = code;
        }

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AccountError::MissingField("name"));
            }
            account.name = name;
        }

        if let Some(parent_id) = patch.parent_id {
            if let Some(parent_id) = parent_id {
                self.slot(parent_id)
                    .map_err(|_| AccountError::ParentNotFound(parent_id))?;
                if self.ancestors_include(parent_id, id) {
                    return Err(AccountError::CycleDetected {
                        account_id: id,
                        parent_id,
                    });
                }
            }
            account.parent_id = parent_id;
        }

        if let Some(is_active) = patch.is_active {
            account.is_active = is_active;
        }
        if let Some(vat_category) = patch.vat_category {
            account.vat_category = vat_category;
        }

        Ok(account)
    }

    /// Checks that an account may be deleted.
    ///
    /// `in_use` reports whether any journal line references the account.
    pub fn validate_delete(&self, id: AccountId, in_use: bool) -> Result<(), AccountError> {
        let account = self.get(id).ok_or(AccountError::NotFound(id))?;
        if account.is_system {
            return Err(AccountError::SystemAccount(id));
        }
        if self.has_children(id) {
            return Err(AccountError::AccountHasChildren(id));
        }
        if in_use {
            return Err(AccountError::AccountInUse(id));
        }
        Ok(())
    }
}
