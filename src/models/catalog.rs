use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BusService {
    pub name: &'static str,
    pub price: f64,
    /// Scheduled departure, as shown to passengers ("9:00 PM").
    pub time: &'static str,
}

pub const BUS_SERVICES: &[BusService] = &[
    BusService {
        name: "Sakeer Express",
        price: 2700.0,
        time: "9:00 PM",
    },
    BusService {
        name: "RS Express",
        price: 2900.0,
        time: "9:00 PM",
    },
    BusService {
        name: "Myown Express",
        price: 2700.0,
        time: "8:45 PM",
    },
    BusService {
        name: "Al Ahla",
        price: 2800.0,
        time: "8:30 PM",
    },
    BusService {
        name: "Al Rashith",
        price: 2700.0,
        time: "8:00 PM",
    },
    BusService {
        name: "Star Travels",
        price: 1600.0,
        time: "9:30 PM",
    },
    BusService {
        name: "Lloyds Travels",
        price: 2700.0,
        time: "9:00 PM",
    },
    BusService {
        name: "Super Line",
        price: 2700.0,
        time: "9:00 PM",
    },
];

pub const CITIES: &[&str] = &[
    "Sammanthurai",
    "Nintavur",
    "Kalmunai",
    "Maruthamunai",
    "Batticaloa",
    "Polonaruwa",
    "Kattunayaka Airport",
    "Akkaraipattu",
    "Colombo",
    "Orugudwaththa",
    "Wellampitiya",
    "Kolonnawa",
    "Rajagiriya",
    "Mardana",
    "Kolluppitiya",
    "Wellwaththa",
    "Dehiwala",
];

/// Exact-name lookup; bus names are what the sheet stores, so no case folding.
pub fn find_bus(name: &str) -> Option<&'static BusService> {
    BUS_SERVICES.iter().find(|b| b.name == name.trim())
}

pub fn is_known_city(name: &str) -> bool {
    CITIES.iter().any(|c| *c == name.trim())
}
