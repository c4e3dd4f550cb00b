/*!
 * Per-doctor WhatsApp message prefixes.
 *
 * The prefix is the text placed in front of shared links, one per supported
 * language, with the doctor's name substituted. Results are cached per doctor
 * on the shared cache backend.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::cache::CacheBackend;
use crate::language_utils::{DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES, normalize_language};

/// Name used when the doctor's name is blank
pub const FALLBACK_DOCTOR_NAME: &str = "your doctor";

/// Default lifetime of cached prefixes
pub const PREFIX_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const PLACEHOLDER: &str = "{doctor_name}";

fn template(language: &str) -> &'static str {
    match language {
        "hi" => concat!(
            "आपके डॉक्टर {doctor_name} ने आपको निम्न वीडियो/वीडियो भेजे हैं। ",
            "कृपया इन्हें ध्यान से देखें और वीडियो में दिए गए निर्देशों का पालन करें, क्योंकि ये आपके डॉक्टर के महत्वपूर्ण निरीक्षणों के लिए हैं। ",
            "आपके बच्चे का स्वास्थ्य और भलाई इन वीडियो में दिए गए निर्देशों का पालन करने पर निर्भर है।"
        ),
        "te" => concat!(
            "మీ డాక్టర్ {doctor_name} మీరు చూడాల్సిన వీడియో/వీడియోలను పంపించారు. ",
            "దయచేసి ఇవి తప్పనిసరిగా చూసి, వీడియోల్లో చెప్పిన సూచనలను పాటించండి, ఇవి మీ డాక్టర్‌కు అవసరమైన ముఖ్యమైన పరిశీలనల కోసం ఉన్నాయి. ",
            "మీ పిల్లల ఆరోగ్యం మరియు శ్రేయస్సు ఈ సూచనలను పాటించడంపై ఆధారపడి ఉంటుంది."
        ),
        "ml" => concat!(
            "നിങ്ങളുടെ ഡോക്ടർ {doctor_name} നിങ്ങളിലേക്ക് താഴെ പറയുന്ന വീഡിയോ/വീഡിയോകൾ അയച്ചിട്ടുണ്ട്. ",
            "ദയവായി ഇവ ശ്രദ്ധയോടെ കാണുകയും വീഡിയോയിൽ പറഞ്ഞിരിക്കുന്ന നിർദ്ദേശങ്ങൾ പാലിക്കുകയും ചെയ്യുക, ഇവ നിങ്ങളുടെ ഡോക്ടറുടെ പ്രധാന നിരീക്ഷണങ്ങൾക്കായി ആണ്. ",
            "നിങ്ങളുടെ കുട്ടിയുടെ ആരോഗ്യവും ക്ഷേമവും ഈ നിർദ്ദേശങ്ങൾ പാലിക്കുന്നതിനെ ആശ്രയിച്ചിരിക്കുന്നു."
        ),
        "mr" => concat!(
            "तुमच्या डॉक्टरांनी {doctor_name} तुम्हाला खालील व्हिडिओ/व्हिडिओ पाठवले आहेत. ",
            "कृपया ते काळजीपूर्वक पहा आणि व्हिडिओमधील सूचना पाळा, कारण हे तुमच्या डॉक्टरांच्या महत्त्वाच्या निरीक्षणांसाठी आहेत. ",
            "तुमच्या मुलाचे आरोग्य आणि कल्याण या सूचनांचे पालन करण्यावर अवलंबून आहे."
        ),
        "kn" => concat!(
            "ನಿಮ್ಮ ವೈದ್ಯರಾದ {doctor_name} ನಿಮಗೆ ಕೆಳಗಿನ ವೀಡಿಯೊ/ವೀಡಿಯೊಗಳನ್ನು ಕಳುಹಿಸಿದ್ದಾರೆ. ",
            "ದಯವಿಟ್ಟು ಅವನ್ನು ಗಮನದಿಂದ ನೋಡಿ ಮತ್ತು ವೀಡಿಯೊಗಳಲ್ಲಿ ನೀಡಿರುವ ಸೂಚನೆಗಳನ್ನು ಅನುಸರಿಸಿ, ಇವು ನಿಮ್ಮ ವೈದ್ಯರಿಗೆ ಅಗತ್ಯವಾದ ಮಹತ್ವದ ಗಮನಿಕೆಗಳಿಗಾಗಿ. ",
            "ನಿಮ್ಮ ಮಗುವಿನ ಆರೋಗ್ಯ ಮತ್ತು ಸುಖಸಮೃದ್ಧಿ ಈ ಸೂಚನೆಗಳನ್ನು ಪಾಲಿಸುವುದರ ಮೇಲೆ ಅವಲಂಬಿತವಾಗಿದೆ."
        ),
        "ta" => concat!(
            "உங்கள் மருத்துவர் {doctor_name} உங்களுக்கு கீழ்க்காணும் வீடியோ/வீடியோக்களை அனுப்பியுள்ளார். ",
            "தயவுசெய்து அவற்றை கவனமாக பார்த்து, வீடியோவில் கூறியுள்ள வழிமுறைகளைப் பின்பற்றவும், இவை உங்கள் மருத்துவரின் முக்கியமான கவனிப்புகளுக்காக அனுப்பப்பட்டவை. ",
            "உங்கள் குழந்தையின் ஆரோக்கியமும் நலனும் இந்த வழிமுறைகளைப் பின்பற்றுவதில் சார்ந்துள்ளது."
        ),
        "bn" => concat!(
            "আপনার ডাক্তার {doctor_name} আপনাকে নিচের ভিডিও/ভিডিওগুলো পাঠিয়েছেন। ",
            "অনুগ্রহ করে এগুলো মনোযোগ দিয়ে দেখুন এবং ভিডিওতে দেওয়া নির্দেশনা মেনে চলুন, কারণ এগুলো আপনার ডাক্তারের গুরুত্বপূর্ণ পর্যবেক্ষণের জন্য। ",
            "আপনার শিশুর স্বাস্থ্য ও সুস্থতা এই নির্দেশনাগুলো অনুসরণ করার ওপর নির্ভর করে।"
        ),
        _ => concat!(
            "Your doctor {doctor_name} has sent you the following video/videos. ",
            "It is very important that you view them and follow the instructions, as these are for important observations by your doctor. ",
            "Your child's health and wellbeing depend upon following the instructions in the videos."
        ),
    }
}

/// Message prefix texts keyed by language code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessagePrefixes(BTreeMap<String, String>);

impl MessagePrefixes {
    /// Render the prefixes for `doctor_name` without touching any cache
    pub fn render(doctor_name: &str) -> Self {
        let name = display_name(doctor_name);
        Self(
            SUPPORTED_LANGUAGES
                .iter()
                .map(|language| {
                    (
                        language.to_string(),
                        template(language).replace(PLACEHOLDER, name),
                    )
                })
                .collect(),
        )
    }

    /// Cache key of the prefixes for `doctor_name`
    pub fn cache_key(doctor_name: &str) -> String {
        let digest = format!("{:x}", Sha1::digest(display_name(doctor_name).as_bytes()));
        format!("wa_prefixes_v2_{}", &digest[..12])
    }

    /// Prefixes for `doctor_name`, served from `backend` when cached
    ///
    /// Backend failures are logged and the prefixes are rendered again.
    pub async fn build(doctor_name: &str, backend: &dyn CacheBackend, ttl: Duration) -> Self {
        let key = Self::cache_key(doctor_name);

        match backend.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_str::<MessagePrefixes>(&cached) {
                Ok(prefixes) if !prefixes.0.is_empty() => return prefixes,
                _ => debug!("Ignoring unusable cached prefixes under '{}'", key),
            },
            Ok(None) => {}
            Err(e) => warn!("Cache backend unavailable for message prefixes: {}", e),
        }

        let prefixes = Self::render(doctor_name);
        match serde_json::to_string(&prefixes) {
            Ok(serialized) => {
                if let Err(e) = backend.set(&key, &serialized, Some(ttl)).await {
                    warn!("Could not cache message prefixes under '{}': {}", key, e);
                }
            }
            Err(e) => warn!("Could not serialize message prefixes: {}", e),
        }
        prefixes
    }

    /// Prefix in `language`, falling back to the default language
    pub fn get(&self, language: &str) -> &str {
        let language = normalize_language(Some(language));
        self.0
            .get(language)
            .or_else(|| self.0.get(DEFAULT_LANGUAGE))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Iterate over (language, prefix) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(language, text)| (language.as_str(), text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn display_name(doctor_name: &str) -> &str {
    match doctor_name.trim() {
        "" => FALLBACK_DOCTOR_NAME,
        name => name,
    }
}
