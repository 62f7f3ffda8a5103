// Static description of each entity the front-end relays to the API.
// The generic relay handlers read everything they need from here.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Number,
    DateTime,
    // Options fetched from this API path
    Select { source: &'static str },
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug)]
pub struct Column {
    pub label: &'static str,
    pub keys: &'static [&'static str],
    pub fallback: &'static str,
    pub is_time: bool,
}

#[derive(Debug)]
pub struct Resource {
    pub title: &'static str,
    pub singular: &'static str,
    pub api_path: &'static str,
    pub hub_path: &'static str,
    pub list_path: &'static str,
    pub create_path: &'static str,
    pub columns: &'static [Column],
    pub create_fields: &'static [Field],
    pub update_fields: &'static [Field],
}

impl Resource {
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.api_path, urlencoding::encode(id))
    }

    /// API paths feeding the create form's select inputs, in field order.
    pub fn option_sources(&self) -> Vec<&'static str> {
        self.create_fields
            .iter()
            .filter_map(|field| match field.kind {
                FieldKind::Select { source } => Some(source),
                _ => None,
            })
            .collect()
    }
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind, required: bool) -> Field {
    Field { name, label, kind, required }
}

const fn column(label: &'static str, keys: &'static [&'static str]) -> Column {
    Column { label, keys, fallback: "", is_time: false }
}

pub static CLIENTS: Resource = Resource {
    title: "Clients",
    singular: "client",
    api_path: "/clients",
    hub_path: "/clients",
    list_path: "/mostrar_client",
    create_path: "/crear_client",
    columns: &[
        column("Name", &["name"]),
        column("Email", &["email"]),
        Column { label: "Phone", keys: &["phone"], fallback: "Not specified", is_time: false },
    ],
    create_fields: &[
        field("name", "Name", FieldKind::Text, true),
        field("email", "Email", FieldKind::Email, true),
        field("phone", "Phone", FieldKind::Text, false),
    ],
    update_fields: &[
        field("name", "Name", FieldKind::Text, true),
        field("email", "Email", FieldKind::Email, true),
        field("phone", "Phone", FieldKind::Text, false),
    ],
};

pub static SERVICES: Resource = Resource {
    title: "Services",
    singular: "service",
    api_path: "/services",
    hub_path: "/serveis",
    list_path: "/mostrar_serveis",
    create_path: "/crear_servei",
    columns: &[
        column("Name", &["name"]),
        column("Description", &["description"]),
        column("Price (€)", &["price"]),
        column("Duration (min)", &["duration"]),
    ],
    create_fields: &[
        field("name", "Service name", FieldKind::Text, true),
        field("price", "Price (€)", FieldKind::Number, true),
        field("duration", "Duration (minutes)", FieldKind::Number, true),
    ],
    update_fields: &[
        field("name", "Service name", FieldKind::Text, true),
        field("description", "Description", FieldKind::Text, true),
        field("price", "Price (€)", FieldKind::Number, true),
    ],
};

pub static INVENTORY: Resource = Resource {
    title: "Inventory",
    singular: "product",
    api_path: "/inventories",
    hub_path: "/inventari",
    list_path: "/mostrar_inventari",
    create_path: "/crear_inventari",
    columns: &[
        column("Product", &["product_name", "name"]),
        column("Quantity", &["quantity"]),
    ],
    create_fields: &[
        field("product_name", "Product name", FieldKind::Text, true),
        field("quantity", "Quantity", FieldKind::Number, true),
    ],
    update_fields: &[
        field("product_name", "Product name", FieldKind::Text, true),
        field("quantity", "Quantity", FieldKind::Number, true),
    ],
};

pub static RESERVATIONS: Resource = Resource {
    title: "Reservations",
    singular: "reservation",
    api_path: "/reservations",
    hub_path: "/reserves",
    list_path: "/llistar_reserves",
    create_path: "/crear_reserva",
    columns: &[
        column("Client", &["client_name"]),
        column("Service", &["service_name"]),
        column("Employee", &["employee_name"]),
        Column { label: "Time", keys: &["reservation_time"], fallback: "", is_time: true },
    ],
    create_fields: &[
        field("client_id", "Client", FieldKind::Select { source: "/clients" }, true),
        field("service_id", "Service", FieldKind::Select { source: "/services" }, true),
        field("employee_id", "Employee", FieldKind::Select { source: "/users" }, true),
        field("reservation_time", "Date and time", FieldKind::DateTime, true),
    ],
    update_fields: &[
        field("reservation_time", "Date and time", FieldKind::DateTime, true),
    ],
};

pub static ALL: [&Resource; 4] = [&CLIENTS, &SERVICES, &INVENTORY, &RESERVATIONS];
