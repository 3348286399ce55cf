use crate::database::schema::UserRole;

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::ManageAllRecipes,
            ActionType::ManageTags,
            ActionType::ManageIngredients,
            ActionType::ManageUsers,
        ],
    ),
];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    ManageOwnSubscriptions,

    ManageAllRecipes,
    ManageTags,
    ManageIngredients,
    ManageUsers,
}

impl ActionType {
    pub fn allowed_for(self, role: &UserRole) -> bool {
        ACTION_TABLE
            .iter()
            .find_map(|(uid, actions)| {
                if uid != role {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_permissions() {
        assert!(ActionType::CreateRecipes.allowed_for(&UserRole::User));
        assert!(ActionType::ManageOwnFavorites.allowed_for(&UserRole::User));
        assert!(!ActionType::ManageAllRecipes.allowed_for(&UserRole::User));
        assert!(!ActionType::ManageTags.allowed_for(&UserRole::User));
    }

    #[test]
    fn test_admin_permissions() {
        assert!(ActionType::ManageAllRecipes.allowed_for(&UserRole::Admin));
        assert!(ActionType::ManageTags.allowed_for(&UserRole::Admin));
        assert!(ActionType::ManageIngredients.allowed_for(&UserRole::Admin));
    }
}
