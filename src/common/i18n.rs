// src/common/i18n.rs

use std::collections::HashMap;

use crate::middleware::i18n::Locale;

pub const DEFAULT_LANG: &str = "es";

// (chave, espanhol, inglês)
const CATALOG: &[(&str, &str, &str)] = &[
    // --- Erros gerais ---
    ("error.validation", "Error de validación", "Validation error"),
    ("error.internal", "Ocurrió un error inesperado.", "An unexpected error occurred."),
    ("error.invalid_token", "Token de autenticación inválido o ausente.", "Missing or invalid authentication token."),
    ("error.invalid_credentials", "Las credenciales proporcionadas son incorrectas.", "The provided credentials are incorrect."),
    ("error.forbidden", "Necesita el permiso '{permission}' para realizar esta acción.", "You need the '{permission}' permission to perform this action."),

    // --- Validação de campos ---
    ("validation.required", "El campo es obligatorio.", "The field is required."),
    ("validation.too_long", "No debe superar {max} caracteres.", "Must not exceed {max} characters."),
    ("validation.length", "Debe tener entre {min} y {max} caracteres.", "Must be between {min} and {max} characters."),
    ("validation.too_short", "Debe tener al menos {min} caracteres.", "Must be at least {min} characters."),
    ("validation.invalid_email", "El correo electrónico no es válido.", "The email address is invalid."),
    ("validation.invalid_percentage", "Debe estar entre 0 y 100.", "Must be between 0 and 100."),
    ("validation.invalid_hex_color", "Debe ser un color hexadecimal con formato #RRGGBB.", "Must be a hex color in #RRGGBB format."),
    ("validation.invalid_name", "El nombre solo puede contener letras y espacios.", "The name may only contain letters and spaces."),
    ("validation.weak_password", "La contraseña debe contener al menos una mayúscula, una minúscula y un número.", "The password must contain an uppercase letter, a lowercase letter and a digit."),
    ("validation.invalid_coordinate", "Coordenada fuera de rango.", "Coordinate out of range."),
    ("validation.taken", "El valor ya está en uso.", "The value has already been taken."),
    ("validation.not_found", "El registro seleccionado no existe.", "The selected record does not exist."),

    // --- Autenticação ---
    ("auth.registered", "Usuario registrado exitosamente", "User registered successfully"),
    ("auth.logged_in", "Inicio de sesión exitoso", "Logged in successfully"),
    ("auth.logged_out", "Cierre de sesión exitoso", "Logged out successfully"),
    ("auth.profile", "Perfil de usuario obtenido exitosamente", "User profile retrieved successfully"),

    // --- Usuários ---
    ("user.list", "Lista de usuarios obtenida exitosamente", "Users retrieved successfully"),
    ("user.found", "Usuario encontrado", "User found"),
    ("user.created", "Usuario creado exitosamente", "User created successfully"),
    ("user.updated", "Usuario actualizado exitosamente", "User updated successfully"),
    ("user.deleted", "Usuario eliminado exitosamente", "User deleted successfully"),
    ("user.not_found", "Usuario no encontrado", "User not found"),
    ("user.login_locations", "Ubicaciones de inicio de sesión obtenidas", "Login locations retrieved"),

    // --- RBAC ---
    ("role.list", "Roles obtenidos exitosamente", "Roles retrieved successfully"),
    ("role.created", "Rol creado exitosamente", "Role created successfully"),
    ("role.updated", "Rol actualizado exitosamente", "Role updated successfully"),
    ("role.deleted", "Rol eliminado exitosamente", "Role deleted successfully"),
    ("role.not_found", "Rol no encontrado", "Role not found"),
    ("role.assigned", "Roles asignados exitosamente", "Roles assigned successfully"),
    ("role.has_users", "No se puede eliminar el rol porque está asignado a usuarios", "The role cannot be deleted because it is assigned to users"),
    ("role.users_with_roles", "Usuarios con roles obtenidos exitosamente", "Users with roles retrieved successfully"),
    ("permission.list", "Permisos obtenidos exitosamente", "Permissions retrieved successfully"),
    ("permission.created", "Permiso creado exitosamente", "Permission created successfully"),

    // --- Empleados ---
    ("employee.list", "Empleados obtenidos exitosamente", "Employees retrieved successfully"),
    ("employee.found", "Empleado encontrado", "Employee found"),
    ("employee.created", "Empleado creado exitosamente", "Employee created successfully"),
    ("employee.updated", "Empleado actualizado exitosamente", "Employee updated successfully"),
    ("employee.deleted", "Empleado eliminado exitosamente", "Employee deleted successfully"),
    ("employee.not_found", "Empleado no encontrado", "Employee not found"),

    // --- Fincas ---
    ("farm.list", "Fincas obtenidas exitosamente", "Farms retrieved successfully"),
    ("farm.found", "Finca encontrada", "Farm found"),
    ("farm.created", "Finca creada exitosamente", "Farm created successfully"),
    ("farm.updated", "Finca actualizada exitosamente", "Farm updated successfully"),
    ("farm.deleted", "Finca eliminada exitosamente", "Farm deleted successfully"),
    ("farm.not_found", "Finca no encontrada", "Farm not found"),
    ("farm.has_employees", "No se puede eliminar la finca porque tiene empleados asociados", "The farm cannot be deleted because it has employees"),

    // --- Departamentos ---
    ("department.list", "Departamentos obtenidos exitosamente", "Departments retrieved successfully"),
    ("department.found", "Departamento encontrado", "Department found"),
    ("department.created", "Departamento creado exitosamente", "Department created successfully"),
    ("department.updated", "Departamento actualizado exitosamente", "Department updated successfully"),
    ("department.deleted", "Departamento eliminado exitosamente", "Department deleted successfully"),
    ("department.not_found", "Departamento no encontrado", "Department not found"),
    ("department.has_structures", "No se puede eliminar el departamento porque tiene estructuras organizacionales asociadas", "The department cannot be deleted because it has organizational structures"),

    // --- Estructuras organizacionales ---
    ("org_structure.list", "Estructuras organizacionales obtenidas exitosamente", "Organizational structures retrieved successfully"),
    ("org_structure.found", "Estructura organizacional encontrada", "Organizational structure found"),
    ("org_structure.created", "Estructura organizacional creada exitosamente", "Organizational structure created successfully"),
    ("org_structure.updated", "Estructura organizacional actualizada exitosamente", "Organizational structure updated successfully"),
    ("org_structure.deleted", "Estructura organizacional eliminada exitosamente", "Organizational structure deleted successfully"),
    ("org_structure.not_found", "Estructura organizacional no encontrada", "Organizational structure not found"),
    ("org_structure.access_updated", "Departamentos de acceso asociados exitosamente", "Access departments updated successfully"),
    ("org_structure.badge_colors", "Colores del carnet obtenidos exitosamente", "Badge colors retrieved successfully"),
    ("org_structure.has_employees", "No se puede eliminar la estructura organizacional porque está en uso por empleados", "The organizational structure cannot be deleted because employees use it"),

    // --- Tipos de contrato ---
    ("contract_type.list", "Tipos de contrato obtenidos exitosamente", "Contract types retrieved successfully"),
    ("contract_type.found", "Tipo de contrato encontrado", "Contract type found"),
    ("contract_type.created", "Tipo de contrato creado exitosamente", "Contract type created successfully"),
    ("contract_type.updated", "Tipo de contrato actualizado exitosamente", "Contract type updated successfully"),
    ("contract_type.deleted", "Tipo de contrato eliminado exitosamente", "Contract type deleted successfully"),
    ("contract_type.not_found", "Tipo de contrato no encontrado", "Contract type not found"),
    ("contract_type.in_use", "No se puede eliminar el tipo de contrato porque está en uso", "The contract type cannot be deleted because it is in use"),

    // --- Centros de costo ---
    ("cost_center.list", "Centros de costo obtenidos exitosamente", "Cost centers retrieved successfully"),
    ("cost_center.found", "Centro de costo encontrado", "Cost center found"),
    ("cost_center.created", "Centro de costo creado exitosamente", "Cost center created successfully"),
    ("cost_center.updated", "Centro de costo actualizado exitosamente", "Cost center updated successfully"),
    ("cost_center.deleted", "Centro de costo eliminado exitosamente", "Cost center deleted successfully"),
    ("cost_center.not_found", "Centro de costo no encontrado", "Cost center not found"),

    // --- Colores ---
    ("color.list", "Colores obtenidos exitosamente", "Colors retrieved successfully"),
    ("color.found", "Color encontrado", "Color found"),
    ("color.created", "Color creado exitosamente", "Color created successfully"),
    ("color.updated", "Color actualizado exitosamente", "Color updated successfully"),
    ("color.deleted", "Color eliminado exitosamente", "Color deleted successfully"),
    ("color.not_found", "Color no encontrado", "Color not found"),
    ("color.in_use", "No se puede eliminar el color porque está en uso", "The color cannot be deleted because it is in use"),
];

/// Catálogo de mensagens em memória, indexado por idioma e chave.
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut es = HashMap::new();
        let mut en = HashMap::new();
        for (key, spanish, english) in CATALOG {
            es.insert(*key, *spanish);
            en.insert(*key, *english);
        }

        let mut messages = HashMap::new();
        messages.insert("es", es);
        messages.insert("en", en);
        Self { messages }
    }

    // Idioma pedido -> idioma padrão -> a própria chave
    pub fn get(&self, locale: &Locale, key: &str) -> String {
        self.messages
            .get(locale.0.as_str())
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.messages.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .map(|message| message.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_spanish_for_unknown_languages() {
        let store = I18nStore::new();
        let message = store.get(&Locale("fr".to_string()), "farm.not_found");
        assert_eq!(message, "Finca no encontrada");
    }

    #[test]
    fn unknown_keys_are_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.get(&Locale("es".to_string()), "nope.nope"), "nope.nope");
    }

    #[test]
    fn every_key_has_both_translations() {
        for (key, spanish, english) in CATALOG {
            assert!(!spanish.is_empty(), "{} sem espanhol", key);
            assert!(!english.is_empty(), "{} sem inglês", key);
        }
    }
}
