//! Indian city coordinates for AUM geography reports.
//!
//! Lookup keys include common alternate spellings (Bengaluru, Gurugram,
//! Vizag, ...) that map onto one canonical city, so workbook rows using
//! either spelling resolve to the same place.

use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CityInfo {
    pub name: &'static str,
    pub state: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

struct CityEntry {
    key: &'static str,
    info: CityInfo,
}

const fn entry(
    key: &'static str,
    name: &'static str,
    latitude: f64,
    longitude: f64,
    state: &'static str,
) -> CityEntry {
    CityEntry {
        key,
        info: CityInfo {
            name,
            state,
            latitude,
            longitude,
        },
    }
}

fn city_table() -> &'static [CityEntry] {
    static TABLE: OnceLock<Vec<CityEntry>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            entry("Mumbai", "Mumbai", 19.0760, 72.8777, "Maharashtra"),
            entry("Delhi", "Delhi", 28.7041, 77.1025, "Delhi"),
            entry("Bangalore", "Bangalore", 12.9716, 77.5946, "Karnataka"),
            entry("Bengaluru", "Bangalore", 12.9716, 77.5946, "Karnataka"),
            entry("Hyderabad", "Hyderabad", 17.3850, 78.4867, "Telangana"),
            entry("Chennai", "Chennai", 13.0827, 80.2707, "Tamil Nadu"),
            entry("Pune", "Pune", 18.5204, 73.8567, "Maharashtra"),
            entry("Kolkata", "Kolkata", 22.5726, 88.3639, "West Bengal"),
            entry("Ahmedabad", "Ahmedabad", 23.0225, 72.5714, "Gujarat"),
            entry("Surat", "Surat", 21.1702, 72.8311, "Gujarat"),
            entry("Jaipur", "Jaipur", 26.9124, 75.7873, "Rajasthan"),
            entry("Lucknow", "Lucknow", 26.8467, 80.9462, "Uttar Pradesh"),
            entry("Chandigarh", "Chandigarh", 30.7333, 76.7794, "Chandigarh"),
            entry("Indore", "Indore", 22.7196, 75.8577, "Madhya Pradesh"),
            entry("Kochi", "Kochi", 9.9312, 76.2673, "Kerala"),
            entry("Cochin", "Kochi", 9.9312, 76.2673, "Kerala"),
            entry("Vadodara", "Vadodara", 22.3072, 73.1812, "Gujarat"),
            entry("Nagpur", "Nagpur", 21.1458, 79.0882, "Maharashtra"),
            entry(
                "Visakhapatnam",
                "Visakhapatnam",
                17.6868,
                83.2185,
                "Andhra Pradesh",
            ),
            entry("Vizag", "Visakhapatnam", 17.6868, 83.2185, "Andhra Pradesh"),
            entry("Coimbatore", "Coimbatore", 11.0168, 76.9558, "Tamil Nadu"),
            entry("Patna", "Patna", 25.5941, 85.1376, "Bihar"),
            entry("Bhubaneswar", "Bhubaneswar", 20.2961, 85.8245, "Odisha"),
            entry("Gurgaon", "Gurgaon", 28.4595, 77.0266, "Haryana"),
            entry("Gurugram", "Gurgaon", 28.4595, 77.0266, "Haryana"),
            entry("Noida", "Noida", 28.5355, 77.3910, "Uttar Pradesh"),
            entry("Thane", "Thane", 19.2183, 72.9781, "Maharashtra"),
            entry("Navi Mumbai", "Navi Mumbai", 19.0330, 73.0297, "Maharashtra"),
            entry("Ghaziabad", "Ghaziabad", 28.6692, 77.4538, "Uttar Pradesh"),
            entry("Faridabad", "Faridabad", 28.4089, 77.3178, "Haryana"),
            entry("Rajkot", "Rajkot", 22.3039, 70.8022, "Gujarat"),
            entry("Meerut", "Meerut", 28.9845, 77.7064, "Uttar Pradesh"),
            entry("Varanasi", "Varanasi", 25.3176, 82.9739, "Uttar Pradesh"),
            entry("Amritsar", "Amritsar", 31.6340, 74.8723, "Punjab"),
            entry("Allahabad", "Allahabad", 25.4358, 81.8463, "Uttar Pradesh"),
            entry("Prayagraj", "Allahabad", 25.4358, 81.8463, "Uttar Pradesh"),
            entry("Ranchi", "Ranchi", 23.3441, 85.3096, "Jharkhand"),
            entry("Howrah", "Howrah", 22.5958, 88.2636, "West Bengal"),
            entry("Jabalpur", "Jabalpur", 23.1815, 79.9864, "Madhya Pradesh"),
            entry("Gwalior", "Gwalior", 26.2183, 78.1828, "Madhya Pradesh"),
            entry("Vijayawada", "Vijayawada", 16.5062, 80.6480, "Andhra Pradesh"),
            entry("Jodhpur", "Jodhpur", 26.2389, 73.0243, "Rajasthan"),
            entry("Madurai", "Madurai", 9.9252, 78.1198, "Tamil Nadu"),
            entry("Raipur", "Raipur", 21.2514, 81.6296, "Chhattisgarh"),
            entry("Kota", "Kota", 25.2138, 75.8648, "Rajasthan"),
            entry("Guwahati", "Guwahati", 26.1445, 91.7362, "Assam"),
            entry(
                "Thiruvananthapuram",
                "Thiruvananthapuram",
                8.5241,
                76.9366,
                "Kerala",
            ),
            entry("Trivandrum", "Thiruvananthapuram", 8.5241, 76.9366, "Kerala"),
            entry("Solapur", "Solapur", 17.6599, 75.9064, "Maharashtra"),
            entry("Hubli", "Hubli", 15.3647, 75.1240, "Karnataka"),
            entry("Mysore", "Mysore", 12.2958, 76.6394, "Karnataka"),
            entry("Mysuru", "Mysore", 12.2958, 76.6394, "Karnataka"),
            entry(
                "Tiruchirappalli",
                "Tiruchirappalli",
                10.7905,
                78.7047,
                "Tamil Nadu",
            ),
            entry("Trichy", "Tiruchirappalli", 10.7905, 78.7047, "Tamil Nadu"),
            entry("Bareilly", "Bareilly", 28.3670, 79.4304, "Uttar Pradesh"),
            entry("Aligarh", "Aligarh", 27.8974, 78.0880, "Uttar Pradesh"),
            entry("Moradabad", "Moradabad", 28.8389, 78.7378, "Uttar Pradesh"),
            entry("Jalandhar", "Jalandhar", 31.3260, 75.5762, "Punjab"),
            entry("Bhopal", "Bhopal", 23.2599, 77.4126, "Madhya Pradesh"),
            entry("Dehradun", "Dehradun", 30.3165, 78.0322, "Uttarakhand"),
            entry("Nashik", "Nashik", 19.9975, 73.7898, "Maharashtra"),
            entry("Aurangabad", "Aurangabad", 19.8762, 75.3433, "Maharashtra"),
            entry("Ludhiana", "Ludhiana", 30.9010, 75.8573, "Punjab"),
            entry("Agra", "Agra", 27.1767, 78.0081, "Uttar Pradesh"),
            entry("Kanpur", "Kanpur", 26.4499, 80.3319, "Uttar Pradesh"),
            entry("Jamshedpur", "Jamshedpur", 22.8046, 86.2029, "Jharkhand"),
            entry("Udaipur", "Udaipur", 24.5854, 73.7125, "Rajasthan"),
            entry("Jammu", "Jammu", 32.7266, 74.8570, "Jammu and Kashmir"),
            entry("Jammu Tawi", "Jammu", 32.7266, 74.8570, "Jammu and Kashmir"),
            entry("Srinagar", "Srinagar", 34.0837, 74.7973, "Jammu and Kashmir"),
            entry("Mangalore", "Mangalore", 12.9141, 74.8560, "Karnataka"),
            entry("Mangaluru", "Mangalore", 12.9141, 74.8560, "Karnataka"),
            entry("Ernakulam", "Ernakulam", 9.9816, 76.2999, "Kerala"),
            entry("Cuttack", "Cuttack", 20.5124, 85.8829, "Odisha"),
            entry("Firozabad", "Firozabad", 27.1591, 78.3957, "Uttar Pradesh"),
            entry("Bhilai", "Bhilai", 21.2095, 81.3784, "Chhattisgarh"),
            entry("Bhiwandi", "Bhiwandi", 19.3009, 73.0643, "Maharashtra"),
            entry("Saharanpur", "Saharanpur", 29.9680, 77.5460, "Uttar Pradesh"),
            entry("Gorakhpur", "Gorakhpur", 26.7606, 83.3732, "Uttar Pradesh"),
            entry("Bikaner", "Bikaner", 28.0229, 73.3119, "Rajasthan"),
            entry("Amravati", "Amravati", 20.9374, 77.7796, "Maharashtra"),
            entry("Jhansi", "Jhansi", 25.4484, 78.5685, "Uttar Pradesh"),
            entry("Ulhasnagar", "Ulhasnagar", 19.2183, 73.1382, "Maharashtra"),
            entry("Sangli", "Sangli", 16.8524, 74.5815, "Maharashtra"),
            entry("Jamnagar", "Jamnagar", 22.4707, 70.0577, "Gujarat"),
            entry("Ujjain", "Ujjain", 23.1765, 75.7885, "Madhya Pradesh"),
            entry("Loni", "Loni", 28.7520, 77.2864, "Uttar Pradesh"),
            entry("Siliguri", "Siliguri", 26.7271, 88.3953, "West Bengal"),
            entry("Pondicherry", "Pondicherry", 11.9416, 79.8083, "Puducherry"),
            entry("Puducherry", "Pondicherry", 11.9416, 79.8083, "Puducherry"),
            entry("Nellore", "Nellore", 14.4426, 79.9865, "Andhra Pradesh"),
            entry("Ajmer", "Ajmer", 26.4499, 74.6399, "Rajasthan"),
            entry("Akola", "Akola", 20.7002, 77.0082, "Maharashtra"),
            entry("Gulbarga", "Gulbarga", 17.3297, 76.8343, "Karnataka"),
            entry("Kalaburagi", "Gulbarga", 17.3297, 76.8343, "Karnataka"),
            entry("Tiruppur", "Tiruppur", 11.1085, 77.3411, "Tamil Nadu"),
            entry("Malegaon", "Malegaon", 20.5579, 74.5287, "Maharashtra"),
            entry("Gaya", "Gaya", 24.7955, 85.0002, "Bihar"),
            entry("Jalgaon", "Jalgaon", 21.0077, 75.5626, "Maharashtra"),
            entry("Unnao", "Unnao", 26.5464, 80.4879, "Uttar Pradesh"),
            entry("Latur", "Latur", 18.4088, 76.5604, "Maharashtra"),
            entry("Patiala", "Patiala", 30.3398, 76.3869, "Punjab"),
            entry("Tirunelveli", "Tirunelveli", 8.7139, 77.7567, "Tamil Nadu"),
            entry("Rohtak", "Rohtak", 28.8955, 76.6066, "Haryana"),
            entry("Korba", "Korba", 22.3595, 82.7501, "Chhattisgarh"),
            entry("Nanded", "Nanded", 19.1383, 77.3210, "Maharashtra"),
            entry("Panipat", "Panipat", 29.3909, 76.9635, "Haryana"),
            entry("Muzaffarpur", "Muzaffarpur", 26.1225, 85.3906, "Bihar"),
            entry("Mathura", "Mathura", 27.4924, 77.6737, "Uttar Pradesh"),
            entry(
                "Rajahmundry",
                "Rajahmundry",
                17.0005,
                81.8040,
                "Andhra Pradesh",
            ),
            entry(
                "Rajahmahendravaram",
                "Rajahmundry",
                17.0005,
                81.8040,
                "Andhra Pradesh",
            ),
            entry("Bilaspur", "Bilaspur", 22.0797, 82.1409, "Chhattisgarh"),
            entry(
                "Shahjahanpur",
                "Shahjahanpur",
                27.8800,
                79.9119,
                "Uttar Pradesh",
            ),
            entry("Parbhani", "Parbhani", 19.2608, 76.7611, "Maharashtra"),
            entry(
                "Muzaffarnagar",
                "Muzaffarnagar",
                29.4727,
                77.7085,
                "Uttar Pradesh",
            ),
            entry("Ratlam", "Ratlam", 23.3315, 75.0367, "Madhya Pradesh"),
            entry("Durgapur", "Durgapur", 23.5204, 87.3119, "West Bengal"),
            entry("Shillong", "Shillong", 25.5788, 91.8933, "Meghalaya"),
            entry("Imphal", "Imphal", 24.8170, 93.9368, "Manipur"),
            entry("Haridwar", "Haridwar", 29.9457, 78.1642, "Uttarakhand"),
            entry("Rishikesh", "Rishikesh", 30.0869, 78.2676, "Uttarakhand"),
            entry("Panaji", "Panaji", 15.4909, 73.8278, "Goa"),
            entry("Panjim", "Panaji", 15.4909, 73.8278, "Goa"),
            entry("Vasco", "Vasco", 15.3983, 73.8156, "Goa"),
            entry("Margao", "Margao", 15.2832, 73.9667, "Goa"),
            entry("Shimla", "Shimla", 31.1048, 77.1734, "Himachal Pradesh"),
            entry("Gangtok", "Gangtok", 27.3389, 88.6065, "Sikkim"),
            entry("Itanagar", "Itanagar", 27.0844, 93.6053, "Arunachal Pradesh"),
            entry("Kohima", "Kohima", 25.6751, 94.1086, "Nagaland"),
            entry("Aizawl", "Aizawl", 23.7271, 92.7176, "Mizoram"),
            entry("Agartala", "Agartala", 23.8315, 91.2868, "Tripura"),
            entry("Dispur", "Dispur", 26.1433, 91.7898, "Assam"),
            entry(
                "Port Blair",
                "Port Blair",
                11.6234,
                92.7265,
                "Andaman and Nicobar Islands",
            ),
            entry("Kavaratti", "Kavaratti", 10.5669, 72.6369, "Lakshadweep"),
            entry("Daman", "Daman", 20.4283, 72.8397, "Daman and Diu"),
            entry(
                "Silvassa",
                "Silvassa",
                20.2737,
                72.9960,
                "Dadra and Nagar Haveli",
            ),
        ]
    })
}

/// Coordinates for a city name, case-insensitive, alias-aware
pub fn lookup_city(name: &str) -> Option<&'static CityInfo> {
    let trimmed = name.trim();
    city_table()
        .iter()
        .find(|e| e.key.eq_ignore_ascii_case(trimmed))
        .map(|e| &e.info)
}
